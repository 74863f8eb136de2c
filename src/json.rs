//! Helpers for JSON request bodies: a body extractor that reports failures
//! with the app's error type, loosely typed scalar inputs, and tri-state
//! fields for partial updates.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::json;

use crate::Error;

/// Like [axum::Json], but rejections are converted into [Error]s so that the
/// client always gets a `{"error": ...}` body.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(request, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(Error::UnsupportedMediaType),
            Err(JsonRejection::JsonDataError(error)) => Err(Error::Validation(error.body_text())),
            Err(rejection) => Err(Error::InvalidJson(rejection.body_text())),
        }
    }
}

/// A JSON scalar for fields that clients may send as a string, a number or a
/// boolean, e.g. `"amount": 12.5` and `"amount": "12.50"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// The textual form of the value. Numbers use their shortest exact
    /// decimal representation.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Bool(value) => value.to_string(),
            Scalar::Number(number) => number.to_string(),
            Scalar::Text(text) => text.clone(),
        }
    }

    /// Whether the value is the empty string, which clients use
    /// interchangeably with `null` for optional IDs.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Scalar::Text(text) if text.is_empty())
    }
}

/// Deserialize a field as `Some(value)` whenever it is present, so that
/// together with `#[serde(default)]`:
///
/// - an absent field is `None` (leave unchanged),
/// - `null` is `Some(None)` (clear the value),
/// - anything else is `Some(Some(value))` (set the value).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The `{"ok": true}` acknowledgement returned by updates and deletes.
pub fn ok_response() -> Response {
    Json(json!({ "ok": true })).into_response()
}
