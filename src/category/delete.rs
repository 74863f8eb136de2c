//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, category::delete_category, database_id::PathId, db::lock_connection,
    json::ok_response, user::UserID,
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. The category's transactions become uncategorized.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Extension(user_id): Extension<UserID>,
    PathId(category_id): PathId,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    delete_category(category_id, user_id, &connection)?;

    tracing::debug!("deleted category {category_id} of user {user_id}");

    Ok(ok_response())
}
