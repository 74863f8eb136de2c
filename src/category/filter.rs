//! Resolves category IDs sent by clients into IDs of the caller's categories.

use rusqlite::Connection;

use crate::{
    Error,
    category::{CategoryId, category_exists},
    json::Scalar,
    user::UserID,
    validation,
};

/// Resolve the optional `category_id` query parameter of a listing or report.
///
/// An absent or empty parameter means "no filter".
///
/// # Errors
///
/// Returns `422 Invalid category_id` if the parameter is not a positive
/// integer, and `404 category_id not found` if it does not name one of the
/// user's categories.
pub fn resolve_category_filter(
    raw_id: Option<&str>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<CategoryId>, Error> {
    let raw_id = match raw_id {
        None | Some("") => return Ok(None),
        Some(raw_id) => raw_id,
    };

    let category_id = validation::parse_id(raw_id).ok_or(Error::InvalidId("category_id"))?;

    require_owned_category(category_id, user_id, connection).map(Some)
}

/// Resolve a `category_id` taken from a JSON body.
///
/// `null` and `""` both mean "uncategorized".
///
/// # Errors
///
/// Same as [resolve_category_filter].
pub fn resolve_category_id(
    value: Option<&Scalar>,
    user_id: UserID,
    connection: &Connection,
) -> Result<Option<CategoryId>, Error> {
    let value = match value {
        None => return Ok(None),
        Some(value) if value.is_empty_text() => return Ok(None),
        Some(value) => value,
    };

    let category_id = validation::id(value).ok_or(Error::InvalidId("category_id"))?;

    require_owned_category(category_id, user_id, connection).map(Some)
}

fn require_owned_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<CategoryId, Error> {
    if category_exists(category_id, user_id, connection)? {
        Ok(category_id)
    } else {
        Err(Error::InvalidCategory)
    }
}
