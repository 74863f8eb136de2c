//! CSRF protection for state-changing requests.
//!
//! Every session carries a random CSRF token. Clients fetch it from
//! `GET /auth/csrf` and echo it back in the `X-CSRF-Token` header (or the
//! `_csrf` query parameter) on every POST, PATCH and DELETE request.

use axum::{
    Json,
    extract::{Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use serde_json::{Value, json};
use subtle::ConstantTimeEq;

use crate::{
    Error,
    auth::{
        SessionState,
        cookie::{load_session, set_session_cookie},
        is_safe_method,
        session::{Session, create_session},
    },
    db::lock_connection,
};

/// The header mutating requests must carry the session's CSRF token in.
pub const CSRF_HEADER: &str = "x-csrf-token";

#[derive(Debug, Deserialize)]
struct CsrfQuery {
    #[serde(rename = "_csrf")]
    csrf: Option<String>,
}

/// Return the CSRF token of the caller's session.
///
/// If the caller has no live session, an anonymous session is created and its
/// cookie is set on the response.
pub async fn get_csrf_token(
    State(state): State<SessionState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<Value>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    if let Some(session) = load_session(&jar, &connection)? {
        return Ok((jar, Json(json!({ "csrf": session.csrf_token }))));
    }

    let new_session = create_session(None, state.session_duration, &connection)?;
    let jar = set_session_cookie(
        jar,
        &new_session.token,
        new_session.session.expires_at,
        state.session_duration,
        state.cookie_policy,
    );

    Ok((jar, Json(json!({ "csrf": new_session.session.csrf_token }))))
}

/// Middleware that rejects mutating requests without the session's CSRF token.
///
/// Requests with a safe method (GET, HEAD, OPTIONS) are passed through.
/// Otherwise the request must have a live session and a matching token, or a
/// `419 Invalid CSRF token` response is returned without running the handler.
///
/// **Note**: The session is placed into the request extensions so that later
/// layers and handlers can use `Extension(session): Extension<Session>`.
pub async fn csrf_guard(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    if is_safe_method(request.method()) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();

    let session = match verify_csrf(&state, &parts) {
        Ok(session) => session,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(session);
    next.run(Request::from_parts(parts, body)).await
}

fn verify_csrf(state: &SessionState, parts: &Parts) -> Result<Session, Error> {
    let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());

    let session = {
        let connection = lock_connection(&state.db_connection)?;
        load_session(&jar, &connection)?
    };

    let Some(session) = session else {
        tracing::debug!("rejected mutating request without a session");
        return Err(Error::InvalidCsrfToken);
    };

    match submitted_token(parts) {
        Some(token) if tokens_match(&session.csrf_token, &token) => Ok(session),
        _ => {
            tracing::debug!("rejected mutating request with a missing or wrong CSRF token");
            Err(Error::InvalidCsrfToken)
        }
    }
}

/// The token from the header, or else from the `_csrf` query parameter,
/// with surrounding whitespace removed.
fn submitted_token(parts: &Parts) -> Option<String> {
    let header_token = parts
        .headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    header_token
        .or_else(|| {
            parts
                .uri
                .query()
                .and_then(|query| serde_urlencoded::from_str::<CsrfQuery>(query).ok())
                .and_then(|query| query.csrf)
        })
        .map(|token| token.trim().to_owned())
}

fn tokens_match(expected: &str, submitted: &str) -> bool {
    !submitted.is_empty() && bool::from(expected.as_bytes().ct_eq(submitted.as_bytes()))
}
