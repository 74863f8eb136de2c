//! Middleware that resolves the caller's identity, slides the session expiry
//! and enforces JSON request bodies.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::{
        Method,
        header::{CONTENT_TYPE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    app_state::CookiePolicy,
    auth::{
        cookie::{get_session_token, set_session_cookie},
        session::{Session, extend_session, find_session},
    },
    db::lock_connection,
    user::UserID,
};

/// The state needed for the session middleware and the session endpoints.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The attributes of the session cookie.
    pub cookie_policy: CookiePolicy,
    /// How long a session stays valid without any requests.
    pub session_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_policy: state.cookie_policy,
            session_duration: state.session_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Whether `method` never changes server state.
pub(crate) fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Middleware function that checks for a logged in session.
///
/// The user ID is placed into the request and then the request executed
/// normally if the session belongs to a user, otherwise a `401 Unauthorized`
/// response is returned. On success the session's expiry is pushed out by the
/// session duration and the refreshed cookie is added to the response.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
///
/// **Note**: If [crate::auth::csrf_guard] ran first, the session it loaded is
/// reused instead of querying the database again.
pub async fn auth_guard(
    State(state): State<SessionState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone());

    let Some(token) = get_session_token(&jar) else {
        return Error::Unauthorized.into_response();
    };

    let verified_session = parts.extensions.get::<Session>().cloned();
    let (user_id, expires_at) = match authenticate(&state, &token, verified_session) {
        Ok(result) => result,
        Err(error) => return error.into_response(),
    };

    tracing::Span::current().record("user_id", user_id.as_i64());
    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = set_session_cookie(
        jar,
        &token,
        expires_at,
        state.session_duration,
        state.cookie_policy,
    );
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Resolve the session to its user and slide the session's expiry.
///
/// Returns the user ID and the new expiry.
fn authenticate(
    state: &SessionState,
    token: &str,
    verified_session: Option<Session>,
) -> Result<(UserID, i64), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let session = match verified_session {
        Some(session) => Some(session),
        None => find_session(token, &connection)?,
    };

    match session {
        Some(Session {
            id,
            user_id: Some(user_id),
            ..
        }) => {
            let expires_at = extend_session(id, state.session_duration, &connection)?;
            Ok((user_id, expires_at))
        }
        _ => Err(Error::Unauthorized),
    }
}

/// Middleware that rejects mutating requests without a JSON content type with
/// `415 Unsupported Media Type`.
///
/// Requests with a safe method (GET, HEAD, OPTIONS) are passed through.
pub async fn json_guard(request: Request, next: Next) -> Response {
    if is_safe_method(request.method()) || has_json_content_type(&request) {
        return next.run(request).await;
    }

    Error::UnsupportedMediaType.into_response()
}

fn has_json_content_type(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("application/json")
        })
        .unwrap_or(false)
}
