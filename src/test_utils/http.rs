use axum::{body::Body, response::Response};
use serde_json::Value;

/// Read the whole body of `response` as JSON.
pub(crate) async fn response_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
