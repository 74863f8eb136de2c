//! The log-in endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, PasswordHash,
    app_state::CookiePolicy,
    auth::{
        cookie::set_session_cookie,
        session::{Session, create_session, delete_session},
    },
    db::lock_connection,
    json::{JsonBody, ok_response},
    user::{User, find_user_by_email},
    validation,
};

/// The state needed for logging in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The attributes of the session cookie.
    pub cookie_policy: CookiePolicy,
    /// How long a session stays valid without any requests.
    pub session_duration: Duration,
    /// The fixed delay applied to every log-in attempt.
    pub login_delay: std::time::Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_policy: state.cookie_policy,
            session_duration: state.session_duration,
            login_delay: state.login_delay,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials sent to the log-in endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LogInData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Handler for log-in requests.
///
/// Every attempt first waits for the configured delay. On success the
/// caller's current session is replaced by a new session bound to the user,
/// with a new token and a new CSRF token. Unknown emails, wrong passwords and
/// malformed credentials all get the same `401 Invalid credentials` response.
pub async fn log_in(
    State(state): State<LogInState>,
    Extension(current_session): Extension<Session>,
    jar: PrivateCookieJar,
    JsonBody(credentials): JsonBody<LogInData>,
) -> Result<Response, Error> {
    tokio::time::sleep(state.login_delay).await;

    let email = credentials.email.trim();
    let user = if validation::email(email) && validation::password(&credentials.password) {
        let connection = lock_connection(&state.db_connection)?;
        find_user_by_email(email, &connection)?
    } else {
        None
    };

    let user = verify_credentials(user, &credentials.password)?;

    let connection = lock_connection(&state.db_connection)?;
    delete_session(current_session.id, &connection)?;
    let new_session = create_session(Some(user.id), state.session_duration, &connection)?;

    tracing::info!("user {} logged in", user.id);

    let jar = set_session_cookie(
        jar,
        &new_session.token,
        new_session.session.expires_at,
        state.session_duration,
        state.cookie_policy,
    );

    Ok((jar, ok_response()).into_response())
}

/// Check `password` against the user's hash.
///
/// When there is no user, the password is checked against a dummy hash so
/// that the response time does not reveal whether the email is registered.
fn verify_credentials(user: Option<User>, password: &str) -> Result<User, Error> {
    let password_hash = match &user {
        Some(user) => user.password_hash.clone(),
        None => PasswordHash::dummy(),
    };

    let is_match = password_hash.verify(password).map_err(|error| {
        tracing::error!("could not verify password: {error}");
        Error::Hashing(error.to_string())
    })?;

    match user {
        Some(user) if is_match => Ok(user),
        _ => Err(Error::InvalidCredentials),
    }
}
