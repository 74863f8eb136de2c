//! Session based authentication: server-side sessions referenced by a private
//! cookie, CSRF tokens bound to each session, and the auth endpoints.

mod cookie;
mod csrf;
mod log_in;
mod log_out;
mod me;
mod middleware;
mod register_user;
mod session;

pub use csrf::{CSRF_HEADER, csrf_guard, get_csrf_token};
pub use log_in::log_in;
pub use log_out::log_out;
pub use me::get_current_user;
pub use middleware::{SessionState, auth_guard, json_guard};
pub use register_user::register_user;
pub use session::{Session, create_session_table};

pub(crate) use middleware::is_safe_method;

#[cfg(test)]
pub(crate) use cookie::COOKIE_SESSION;
