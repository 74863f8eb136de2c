//! The endpoint that tells a client who is logged in.

use axum::{Json, extract::State};
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    Error,
    auth::{SessionState, cookie::load_session},
    db::lock_connection,
    user::{User, get_user_by_id},
};

/// The public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_i64(),
            email: user.email,
            display_name: user.display_name,
            created_at: user.created_at,
        }
    }
}

/// Return `{"user": {...}}` for a logged in caller and `{"user": null}` otherwise.
pub async fn get_current_user(
    State(state): State<SessionState>,
    jar: PrivateCookieJar,
) -> Result<Json<Value>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user_id = load_session(&jar, &connection)?.and_then(|session| session.user_id);
    let profile = match user_id {
        Some(user_id) => match get_user_by_id(user_id, &connection) {
            Ok(user) => Some(UserProfile::from(user)),
            Err(Error::NotFound(_)) => None,
            Err(error) => return Err(error),
        },
        None => None,
    };

    Ok(Json(json!({ "user": profile })))
}
