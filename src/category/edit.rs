//! Category update endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{CategoryName, CategoryUpdate, domain::parse_color, update_category},
    database_id::PathId,
    db::lock_connection,
    json::{JsonBody, Scalar, double_option, ok_response},
    user::UserID,
    validation,
};

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a partial category update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryData {
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color_hex: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub is_archived: Option<Option<Scalar>>,
}

impl TryFrom<UpdateCategoryData> for CategoryUpdate {
    type Error = Error;

    fn try_from(data: UpdateCategoryData) -> Result<Self, Self::Error> {
        let name = data
            .name
            .map(|name| CategoryName::new(name.as_deref().unwrap_or_default()))
            .transpose()?;

        let color_hex = data.color_hex.map(parse_color).transpose()?;

        let is_archived = data
            .is_archived
            .map(|flag| {
                flag.as_ref()
                    .and_then(validation::bool_like)
                    .ok_or_else(|| Error::Validation("Invalid is_archived".to_owned()))
            })
            .transpose()?;

        Ok(CategoryUpdate {
            name,
            color_hex,
            is_archived,
        })
    }
}

/// Handle a partial category update: `{"ok": true}`.
///
/// The fields are validated before ownership is checked, so a bad field on
/// someone else's category is still a `422`.
pub async fn update_category_endpoint(
    State(state): State<UpdateCategoryState>,
    Extension(user_id): Extension<UserID>,
    PathId(category_id): PathId,
    JsonBody(data): JsonBody<UpdateCategoryData>,
) -> Result<Response, Error> {
    let update = CategoryUpdate::try_from(data)?;

    let connection = lock_connection(&state.db_connection)?;
    update_category(category_id, user_id, &update, &connection)?;

    Ok(ok_response())
}

#[cfg(test)]
mod update_category_data_tests {
    use crate::{
        Error,
        category::{CategoryName, CategoryUpdate},
    };

    use super::UpdateCategoryData;

    fn parse(json: &str) -> Result<CategoryUpdate, Error> {
        let data: UpdateCategoryData = serde_json::from_str(json).unwrap();

        CategoryUpdate::try_from(data)
    }

    #[test]
    fn empty_body_is_empty_update() {
        assert!(parse("{}").unwrap().is_empty());
    }

    #[test]
    fn null_color_clears_color() {
        let update = parse(r#"{"color_hex": null}"#).unwrap();

        assert_eq!(update.color_hex, Some(None));
    }

    #[test]
    fn null_name_is_invalid() {
        assert_eq!(
            parse(r#"{"name": null}"#),
            Err(Error::Validation("Invalid category name".to_owned()))
        );
    }

    #[test]
    fn name_is_trimmed() {
        let update = parse(r#"{"name": "  Food "}"#).unwrap();

        assert_eq!(update.name, Some(CategoryName::new_unchecked("Food")));
    }

    #[test]
    fn archived_flag_accepts_bool_like_values() {
        for (json, want) in [
            (r#"{"is_archived": true}"#, true),
            (r#"{"is_archived": 0}"#, false),
            (r#"{"is_archived": "1"}"#, true),
        ] {
            assert_eq!(parse(json).unwrap().is_archived, Some(want), "{json}");
        }
    }

    #[test]
    fn archived_flag_rejects_other_values() {
        for json in [r#"{"is_archived": "yes"}"#, r#"{"is_archived": null}"#] {
            assert_eq!(
                parse(json),
                Err(Error::Validation("Invalid is_archived".to_owned()))
            );
        }
    }
}
