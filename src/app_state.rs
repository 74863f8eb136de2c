//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::{Key, SameSite};
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, PasswordHash, config::AppConfig, db::initialize};

/// The default idle lifetime of a session.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::minutes(1440);

/// The default fixed delay applied to every log-in attempt.
pub const DEFAULT_LOGIN_DELAY: std::time::Duration = std::time::Duration::from_millis(200);

/// The attributes set on the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    /// Whether the cookie is only sent over HTTPS.
    pub secure: bool,
    /// The cookie's `SameSite` attribute.
    pub same_site: SameSite,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            secure: false,
            same_site: SameSite::Lax,
        }
    }
}

/// The deployment environment, e.g. "production" or "development".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEnv(String);

impl AppEnv {
    /// Create an app environment from its name.
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Whether internal error details must be hidden from clients.
    pub fn is_production(&self) -> bool {
        self.0 == "production"
    }

    /// The environment's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AppEnv {
    fn default() -> Self {
        Self::new("production")
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The attributes of the session cookie.
    pub cookie_policy: CookiePolicy,

    /// How long a session stays valid without any requests.
    pub session_duration: Duration,

    /// The fixed delay applied to every log-in attempt.
    pub login_delay: std::time::Duration,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// The deployment environment.
    pub app_env: AppEnv,

    /// The origins allowed to make cross-origin requests.
    pub allowed_origins: Arc<[String]>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection and default
    /// settings.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, cookie_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_policy: CookiePolicy::default(),
            session_duration: DEFAULT_SESSION_DURATION,
            login_delay: DEFAULT_LOGIN_DELAY,
            password_cost: PasswordHash::DEFAULT_COST,
            app_env: AppEnv::default(),
            allowed_origins: Arc::from(["http://localhost:5173".to_owned()]),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Create a new [AppState] with the settings in `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn from_config(db_connection: Connection, config: &AppConfig) -> Result<Self, Error> {
        let state = Self::new(db_connection, &config.secret)?;

        Ok(Self {
            cookie_policy: CookiePolicy {
                secure: config.cookie_secure,
                same_site: config.cookie_same_site.into(),
            },
            session_duration: Duration::minutes(config.session_minutes),
            login_delay: std::time::Duration::from_millis(config.login_delay_ms),
            app_env: AppEnv::new(&config.app_env),
            allowed_origins: config
                .cors_origins
                .iter()
                .map(|origin| origin.trim().to_owned())
                .filter(|origin| !origin.is_empty())
                .collect(),
            ..state
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod app_state_tests {
    use clap::Parser;
    use rusqlite::Connection;

    use crate::config::AppConfig;

    use super::{AppEnv, AppState};

    #[test]
    fn from_config_copies_settings() {
        let config = AppConfig::try_parse_from([
            "server",
            "--db-path",
            ":memory:",
            "--secret",
            "abc",
            "--app-env",
            "development",
            "--cors-origins",
            "http://a.test, http://b.test",
            "--session-minutes",
            "30",
        ])
        .unwrap();

        let state =
            AppState::from_config(Connection::open_in_memory().unwrap(), &config).unwrap();

        assert_eq!(state.app_env, AppEnv::new("development"));
        assert!(!state.app_env.is_production());
        assert_eq!(&*state.allowed_origins, ["http://a.test", "http://b.test"]);
        assert_eq!(state.session_duration, time::Duration::minutes(30));
    }
}
