//! Defines the app level error type and its conversion to JSON error responses.

use std::any::Any;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The message sent to clients in place of the details of an internal error.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request field was missing, malformed or out of range.
    #[error("{0}")]
    Validation(String),

    /// A period token did not match `YYYY-MM` or `YYYY`, or named a
    /// month/year that does not exist.
    #[error("{0}")]
    InvalidPeriod(String),

    /// An ID was not a positive integer. The string is the name of the field.
    #[error("Invalid {0}")]
    InvalidId(&'static str),

    /// A PATCH request did not contain any field that can be updated.
    #[error("No fields to update")]
    NoFieldsToUpdate,

    /// The request body could not be parsed as a JSON object.
    ///
    /// The string holds the parser's message for the server logs.
    #[error("Invalid JSON body")]
    InvalidJson(String),

    /// The request body is larger than [crate::logging::REQUEST_BODY_LIMIT].
    #[error("Request body too large")]
    PayloadTooLarge,

    /// A mutating request did not declare a JSON body.
    #[error("Content-Type must be application/json")]
    UnsupportedMediaType,

    /// The request has no session or the session is not logged in.
    #[error("Unauthorized")]
    Unauthorized,

    /// The email and password did not match a registered user.
    ///
    /// The same error is used for unknown emails and wrong passwords so that
    /// clients cannot tell which one it was.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A mutating request was missing the CSRF token or the token did not
    /// match the session's token.
    #[error("Invalid CSRF token")]
    InvalidCsrfToken,

    /// A cross-origin request came from an origin outside the allow-list.
    #[error("Origin not allowed")]
    OriginNotAllowed,

    /// The requested resource does not exist or belongs to another user.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("{0}")]
    NotFound(&'static str),

    /// The email is already registered.
    #[error("Email already in use")]
    DuplicateEmail,

    /// The user already has a category with the requested name.
    #[error("Category already exists")]
    DuplicateCategory,

    /// A category ID in a request body did not refer to one of the caller's
    /// categories.
    #[error("category_id not found")]
    InvalidCategory,

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    Hashing(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    Sql(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// Any other unexpected failure, e.g. a handler panic.
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// The generic "not found" error used for resources that do not exist or
    /// are owned by another user.
    pub const NOT_FOUND: Error = Error::NotFound("Not Found");

    /// The HTTP status code the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidPeriod(_) | Error::InvalidId(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::NoFieldsToUpdate | Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::Unauthorized | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::InvalidCsrfToken => csrf_failure_status(),
            Error::OriginNotAllowed => StatusCode::FORBIDDEN,
            Error::NotFound(_) | Error::InvalidCategory => StatusCode::NOT_FOUND,
            Error::DuplicateEmail | Error::DuplicateCategory => StatusCode::CONFLICT,
            Error::Hashing(_) | Error::Sql(_) | Error::DatabaseLock | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// The non-standard "419 Page Expired" status used for CSRF failures so that
/// clients can tell them apart from auth failures.
fn csrf_failure_status() -> StatusCode {
    StatusCode::from_u16(419).unwrap_or(StatusCode::FORBIDDEN)
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Sql(left), Error::Sql(right)) => left.to_string() == right.to_string(),
            (left, right) => {
                std::mem::discriminant(left) == std::mem::discriminant(right)
                    && left.to_string() == right.to_string()
            }
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("category.user_id, category.name") =>
            {
                Error::DuplicateCategory
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NOT_FOUND,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::Sql(error)
            }
        }
    }
}

/// The details of an internal error, attached to the response so that
/// [crate::logging::expose_internal_errors] can show them outside production.
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_internal() {
            tracing::error!("An unexpected error occurred: {}", self);

            let mut response =
                (status, Json(json!({ "error": INTERNAL_ERROR_MESSAGE }))).into_response();
            response
                .extensions_mut()
                .insert(InternalErrorDetail(self.to_string()));

            return response;
        }

        if let Error::InvalidJson(reason) = &self {
            tracing::debug!("rejected request body: {reason}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Convert a handler panic into an internal error response.
///
/// Used with [tower_http::catch_panic::CatchPanicLayer].
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else {
        "unknown panic message".to_owned()
    };

    Error::Internal(format!("handler panicked: {details}")).into_response()
}

#[cfg(test)]
mod error_response_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use serde_json::Value;

    use crate::error::{Error, INTERNAL_ERROR_MESSAGE, InternalErrorDetail};

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_422_with_message() {
        let response = Error::Validation("Invalid email".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "Invalid email");
    }

    #[tokio::test]
    async fn csrf_error_uses_419() {
        let response = Error::InvalidCsrfToken.into_response();

        assert_eq!(response.status().as_u16(), 419);
        assert_eq!(body_json(response).await["error"], "Invalid CSRF token");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = Error::Internal("secret stack trace".to_owned()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<InternalErrorDetail>().cloned();
        assert_eq!(detail.unwrap().0, "secret stack trace");
        assert_eq!(body_json(response).await["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NOT_FOUND);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() {
        let response = super::handle_panic(Box::new("boom"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<InternalErrorDetail>().cloned();
        assert_eq!(detail.unwrap().0, "handler panicked: boom");
        assert_eq!(body_json(response).await["error"], INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn invalid_id_names_the_field() {
        assert_eq!(Error::InvalidId("category_id").to_string(), "Invalid category_id");
    }
}
