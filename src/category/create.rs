//! Category creation endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    category::{CategoryName, create_category, domain::parse_color},
    db::lock_connection,
    json::JsonBody,
    user::UserID,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a category creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategoryData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color_hex: Option<String>,
}

/// Handle category creation: `201 {id, name, color_hex}`.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Extension(user_id): Extension<UserID>,
    JsonBody(data): JsonBody<CreateCategoryData>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&data.name)?;
    let color_hex = parse_color(data.color_hex)?;

    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(user_id, name, color_hex, &connection)?;

    tracing::debug!("created category {} for user {user_id}", category.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": category.id,
            "name": category.name,
            "color_hex": category.color_hex,
        })),
    )
        .into_response())
}
