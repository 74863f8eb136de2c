//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword, db::lock_connection, json::JsonBody,
    user::create_user, validation,
};

/// The state needed for registering a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The bcrypt cost used when hashing passwords.
    pub password_cost: u32,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_cost: state.password_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data needed to register a user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Handler for registering a new user.
///
/// Registering does not log the user in.
///
/// # Errors
///
/// Returns a `422` for an invalid email, password or display name, and a
/// `409` if the email is already registered.
pub async fn register_user(
    State(state): State<RegistrationState>,
    JsonBody(data): JsonBody<RegisterData>,
) -> Result<Response, Error> {
    let email = data.email.trim();
    if !validation::email(email) {
        return Err(Error::Validation("Invalid email".to_owned()));
    }

    let password = ValidatedPassword::new(&data.password)?;

    let display_name = data
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if display_name.is_some_and(|name| !validation::string_len(name, 1, 100)) {
        return Err(Error::Validation("display_name length 1..100".to_owned()));
    }

    let password_hash = PasswordHash::new(password, state.password_cost)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(email, password_hash, display_name, &connection)?;

    tracing::info!("registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(json!({ "ok": true }))).into_response())
}
