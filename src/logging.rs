//! Middleware for logging requests and responses, and the per-request span.

use std::{net::SocketAddr, time::Instant};

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{
        HeaderMap,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::Span;

use crate::{
    Error,
    app_state::AppEnv,
    error::{INTERNAL_ERROR_MESSAGE, InternalErrorDetail},
};

/// Request and response bodies longer than this many bytes are truncated in
/// `info` logs. The full body is logged at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest request body the API accepts. Bodies are buffered for
/// logging before any extractor runs, so the limit is enforced here.
pub const REQUEST_BODY_LIMIT: usize = 2 * 1024 * 1024;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// The request line and body are logged when the request arrives, and the
/// status, latency and body of the response when it is sent. Any JSON field
/// whose name contains "password" is redacted from request bodies.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    if content_length(&parts.headers).is_some_and(|length| length > REQUEST_BODY_LIMIT) {
        return Error::PayloadTooLarge.into_response();
    }

    let body_bytes = match axum::body::to_bytes(body, REQUEST_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!("could not read request body: {error}");
            return Error::PayloadTooLarge.into_response();
        }
    };

    let body_text = String::from_utf8_lossy(&body_bytes);
    let display_text = if is_json(&parts.headers) {
        redact_passwords(&body_text)
    } else {
        body_text.into_owned()
    };
    log_body(
        &format!("Received request: {} {}", parts.method, parts.uri),
        &display_text,
    );

    let start = Instant::now();
    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;
    let latency = start.elapsed();

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => return Error::Internal(error.to_string()).into_response(),
    };

    log_body(
        &format!("Sending response: {} in {latency:?}", parts.status),
        &String::from_utf8_lossy(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

/// Replace the value of every field whose name contains "password".
///
/// Bodies that are not valid JSON are not logged at all, since there is no
/// way to tell where a password would be.
fn redact_passwords(body_text: &str) -> String {
    if body_text.is_empty() {
        return String::new();
    }

    match serde_json::from_str::<Value>(body_text) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => "<invalid JSON>".to_owned(),
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.to_ascii_lowercase().contains("password") {
                    *field = Value::String(REDACTED.to_owned());
                } else {
                    redact_value(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

fn log_body(message: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{message}\nbody: {}...", truncate(body, LOG_BODY_LENGTH_LIMIT));
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{message}\nbody: {body:?}");
    }
}

/// The longest prefix of `text` that is at most `max_bytes` long and ends on
/// a character boundary.
fn truncate(text: &str, max_bytes: usize) -> &str {
    let end = text
        .char_indices()
        .map(|(index, _)| index)
        .take_while(|index| *index <= max_bytes)
        .last()
        .unwrap_or(0);

    if text.len() <= max_bytes {
        text
    } else {
        &text[..end]
    }
}

/// Create the span that every log line of a request is recorded in.
///
/// The `user_id` field starts out empty and is filled in by
/// [crate::auth::auth_guard] once the caller is known.
pub fn make_request_span(request: &Request) -> Span {
    let method = request.method();
    let path = request.uri().path();
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str());
    let ip = client_ip(request);

    tracing::info_span!(
        "request",
        %method,
        path,
        matched_path,
        ip,
        user_id = tracing::field::Empty,
    )
}

/// The client's address: the first `X-Forwarded-For` entry if there is one,
/// otherwise the peer address of the connection.
fn client_ip(request: &Request) -> Option<String> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match forwarded {
        Some(ip) => Some(ip.to_owned()),
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(address)| address.ip().to_string()),
    }
}

/// Middleware that puts the details of internal errors into the response
/// body outside of production.
///
/// In production the generic `Internal Server Error` body is left untouched.
pub async fn expose_internal_errors(
    State(app_env): State<AppEnv>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if app_env.is_production() {
        return response;
    }

    let Some(InternalErrorDetail(detail)) =
        response.extensions().get::<InternalErrorDetail>().cloned()
    else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let body = Json(json!({ "error": INTERNAL_ERROR_MESSAGE, "detail": detail }));

    (parts, body).into_response()
}
