//! Command line and environment configuration for the API server.

use axum_extra::extract::cookie::SameSite;
use clap::{Parser, ValueEnum};

/// The REST API server for Budget Buddy.
///
/// Every option can also be set with the environment variable shown in its
/// help text.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct AppConfig {
    /// File path to the application SQLite database.
    #[arg(long, env = "DB_PATH")]
    pub db_path: String,

    /// Secret used to derive the key that encrypts session cookies.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub secret: String,

    /// The address to listen on.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Comma separated list of origins allowed to make cross-origin requests.
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173"
    )]
    pub cors_origins: Vec<String>,

    /// The deployment environment. Any value other than `production` includes
    /// the details of internal errors in responses.
    #[arg(long, env = "APP_ENV", default_value = "production")]
    pub app_env: String,

    /// Only send the session cookie over HTTPS.
    #[arg(long, env = "APP_COOKIE_SECURE", default_value_t = false)]
    pub cookie_secure: bool,

    /// The `SameSite` attribute of the session cookie.
    #[arg(long, env = "APP_COOKIE_SAMESITE", value_enum, default_value_t = CookieSameSite::Lax)]
    pub cookie_same_site: CookieSameSite,

    /// How long a session stays valid without any requests, in minutes.
    #[arg(long, env = "SESSION_MINUTES", default_value_t = 1440)]
    pub session_minutes: i64,

    /// Fixed delay added to every log-in attempt, in milliseconds.
    #[arg(long, env = "LOGIN_DELAY_MS", default_value_t = 200)]
    pub login_delay_ms: u64,

    /// The format of the server logs.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// The accepted values of the session cookie's `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CookieSameSite {
    Strict,
    Lax,
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }
    }
}

/// How log lines are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human readable output.
    Pretty,
    /// One JSON object per line.
    Json,
}
