//! Database ID types and the extractor for IDs in request paths.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::{Error, validation};

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;

/// Database identifier for a transaction.
pub type TransactionId = DatabaseID;

/// A positive integer ID taken from the `{id}` segment of the request path.
///
/// Anything that is not a positive integer is rejected with `422 Invalid id`
/// instead of axum's plain text path rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub DatabaseID);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::InvalidId("id"))?;

        validation::parse_id(&raw_id)
            .map(PathId)
            .ok_or(Error::InvalidId("id"))
    }
}
