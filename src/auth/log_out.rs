//! Log-out route handler that deletes the session and invalidates the session cookie.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error,
    auth::{
        SessionState,
        cookie::invalidate_session_cookie,
        session::{Session, delete_session},
    },
    db::lock_connection,
    json::ok_response,
};

/// Delete the caller's session and tell the client to drop the session cookie.
pub async fn log_out(
    State(state): State<SessionState>,
    Extension(session): Extension<Session>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    {
        let connection = lock_connection(&state.db_connection)?;
        delete_session(session.id, &connection)?;
    }

    if let Some(user_id) = session.user_id {
        tracing::info!("user {user_id} logged out");
    }

    let jar = invalidate_session_cookie(jar, state.cookie_policy);

    Ok((jar, ok_response()).into_response())
}
