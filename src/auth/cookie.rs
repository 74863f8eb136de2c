//! Defines functions for storing the session token in a private cookie.

use axum_extra::extract::{PrivateCookieJar, cookie::Cookie};
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    app_state::CookiePolicy,
    auth::session::{Session, find_session},
};

/// The name of the cookie holding the session token.
pub(crate) const COOKIE_SESSION: &str = "session";

/// Add the session cookie to the cookie jar.
///
/// `expires_at` is a unix timestamp. If it cannot be represented as a date
/// time, the cookie is given a max age of `duration` instead.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    token: &str,
    expires_at: i64,
    duration: Duration,
    policy: CookiePolicy,
) -> PrivateCookieJar {
    let cookie = Cookie::build((COOKIE_SESSION, token.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(policy.same_site)
        .secure(policy.secure);

    let cookie = match OffsetDateTime::from_unix_timestamp(expires_at) {
        Ok(expiry) => cookie.expires(expiry),
        Err(_) => cookie.max_age(duration),
    };

    jar.add(cookie)
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(
    jar: PrivateCookieJar,
    policy: CookiePolicy,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(policy.same_site)
            .secure(policy.secure),
    )
}

/// Get the session token from the cookie jar, if there is one.
pub(crate) fn get_session_token(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(COOKIE_SESSION)
        .map(|cookie| cookie.value_trimmed().to_owned())
}

/// Look up the live session referred to by the session cookie.
///
/// # Errors
///
/// Returns an [Error::Sql] if an SQL related error occurred.
pub(crate) fn load_session(
    jar: &PrivateCookieJar,
    connection: &Connection,
) -> Result<Option<Session>, Error> {
    match get_session_token(jar) {
        Some(token) => find_session(&token, connection),
        None => Ok(None),
    }
}
