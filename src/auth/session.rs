//! Server-side sessions.
//!
//! The client only ever sees an opaque random token. The database stores the
//! SHA-256 hash of that token, so a leaked database cannot be used to hijack
//! sessions.

use rand::RngCore;
use rusqlite::{Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::{Error, db::SQL_NOW, user::UserID};

/// The number of random bytes in session and CSRF tokens.
const TOKEN_BYTES: usize = 32;

/// A session row.
///
/// Anonymous sessions (no `user_id`) exist so that a CSRF token can be issued
/// before the user logs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The session's ID in the database.
    pub id: i64,
    /// The logged in user, if any.
    pub user_id: Option<UserID>,
    /// The token that mutating requests in this session must echo back.
    pub csrf_token: String,
    /// When the session expires, as a unix timestamp.
    pub expires_at: i64,
}

/// A newly created session along with the raw token to give to the client.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub session: Session,
    pub token: String,
}

/// Generate a random, hex encoded token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Create the session table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY,
                token_hash TEXT NOT NULL UNIQUE,
                user_id INTEGER REFERENCES user(id) ON DELETE CASCADE,
                csrf_token TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT ({SQL_NOW}),
                expires_at INTEGER NOT NULL
                )"
        ),
        (),
    )?;

    Ok(())
}

/// Create a session for `user_id` (or an anonymous session) with a fresh
/// token and CSRF token that expires `duration` from now.
///
/// # Errors
///
/// Returns an [Error::Internal] if the expiry overflows, or an [Error::Sql]
/// if the session could not be inserted.
pub fn create_session(
    user_id: Option<UserID>,
    duration: Duration,
    connection: &Connection,
) -> Result<NewSession, Error> {
    delete_expired_sessions(connection)?;

    let token = generate_token();
    let csrf_token = generate_token();
    let expires_at = expiry_from_now(duration)?;

    connection.execute(
        "INSERT INTO session (token_hash, user_id, csrf_token, expires_at)
        VALUES (?1, ?2, ?3, ?4)",
        (
            hash_token(&token),
            user_id.map(|id| id.as_i64()),
            &csrf_token,
            expires_at,
        ),
    )?;

    let session = Session {
        id: connection.last_insert_rowid(),
        user_id,
        csrf_token,
        expires_at,
    };

    Ok(NewSession { session, token })
}

/// Find the live session for `token`.
///
/// An expired session is deleted and treated as if it did not exist.
///
/// # Errors
///
/// Returns an [Error::Sql] if an SQL related error occurred.
pub fn find_session(token: &str, connection: &Connection) -> Result<Option<Session>, Error> {
    let session = connection
        .prepare(
            "SELECT id, user_id, csrf_token, expires_at FROM session WHERE token_hash = :token_hash",
        )?
        .query_row(&[(":token_hash", &hash_token(token))], map_row)
        .optional()?;

    match session {
        Some(session) if session.expires_at <= OffsetDateTime::now_utc().unix_timestamp() => {
            tracing::debug!("session {} expired", session.id);
            delete_session(session.id, connection)?;
            Ok(None)
        }
        session => Ok(session),
    }
}

/// Push a session's expiry out to `duration` from now.
///
/// Returns the new expiry as a unix timestamp.
///
/// # Errors
///
/// Returns an [Error::Internal] if the expiry overflows, or an [Error::Sql]
/// if the session could not be updated.
pub fn extend_session(
    session_id: i64,
    duration: Duration,
    connection: &Connection,
) -> Result<i64, Error> {
    let expires_at = expiry_from_now(duration)?;

    connection.execute(
        "UPDATE session SET expires_at = ?1 WHERE id = ?2",
        (expires_at, session_id),
    )?;

    Ok(expires_at)
}

/// Delete a session. Deleting a session that does not exist is not an error.
///
/// # Errors
///
/// Returns an [Error::Sql] if an SQL related error occurred.
pub fn delete_session(session_id: i64, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM session WHERE id = ?1", [session_id])?;

    Ok(())
}

/// Delete every session that has expired, returning how many were deleted.
///
/// Abandoned sessions are never presented again, so they are swept whenever
/// a new session is created.
///
/// # Errors
///
/// Returns an [Error::Sql] if an SQL related error occurred.
pub fn delete_expired_sessions(connection: &Connection) -> Result<usize, Error> {
    let deleted = connection.execute(
        "DELETE FROM session WHERE expires_at <= ?1",
        [OffsetDateTime::now_utc().unix_timestamp()],
    )?;

    if deleted > 0 {
        tracing::debug!("deleted {deleted} expired sessions");
    }

    Ok(deleted)
}

fn expiry_from_now(duration: Duration) -> Result<i64, Error> {
    OffsetDateTime::now_utc()
        .checked_add(duration)
        .map(|expiry| expiry.unix_timestamp())
        .ok_or_else(|| Error::Internal("session expiry overflowed".to_owned()))
}

fn map_row(row: &Row) -> Result<Session, rusqlite::Error> {
    let user_id: Option<i64> = row.get(1)?;

    Ok(Session {
        id: row.get(0)?,
        user_id: user_id.map(UserID::new),
        csrf_token: row.get(2)?,
        expires_at: row.get(3)?,
    })
}

#[cfg(test)]
mod session_tests {
    use rusqlite::Connection;
    use time::Duration;

    use crate::{PasswordHash, db::initialize, user::create_user};

    use super::{
        create_session, delete_expired_sessions, delete_session, extend_session, find_session,
        generate_token,
    };

    fn get_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn tokens_are_random_hex() {
        let token = generate_token();

        assert_eq!(token.len(), 64);
        assert!(token.bytes().all(|byte| byte.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn find_session_by_token() {
        let connection = get_db_connection();
        let new_session = create_session(None, Duration::minutes(5), &connection).unwrap();

        let found = find_session(&new_session.token, &connection).unwrap();

        assert_eq!(found, Some(new_session.session));
    }

    #[test]
    fn token_is_not_stored_in_plain_text() {
        let connection = get_db_connection();
        let new_session = create_session(None, Duration::minutes(5), &connection).unwrap();

        let stored: String = connection
            .query_row("SELECT token_hash FROM session", [], |row| row.get(0))
            .unwrap();

        assert_ne!(stored, new_session.token);
    }

    #[test]
    fn session_can_belong_to_user() {
        let connection = get_db_connection();
        let user = create_user(
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            None,
            &connection,
        )
        .unwrap();

        let new_session = create_session(Some(user.id), Duration::minutes(5), &connection).unwrap();

        let found = find_session(&new_session.token, &connection).unwrap().unwrap();
        assert_eq!(found.user_id, Some(user.id));
    }

    #[test]
    fn unknown_token_has_no_session() {
        let connection = get_db_connection();

        let found = find_session("nope", &connection).unwrap();

        assert_eq!(found, None);
    }

    #[test]
    fn expired_session_is_deleted() {
        let connection = get_db_connection();
        let new_session = create_session(None, Duration::seconds(-1), &connection).unwrap();

        let found = find_session(&new_session.token, &connection).unwrap();

        assert_eq!(found, None);
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM session", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn creating_a_session_sweeps_expired_sessions() {
        let connection = get_db_connection();
        for _ in 0..100 {
            create_session(None, Duration::seconds(-1), &connection).unwrap();
        }

        let live = create_session(None, Duration::minutes(5), &connection).unwrap();

        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM session", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            find_session(&live.token, &connection).unwrap(),
            Some(live.session)
        );
    }

    #[test]
    fn delete_expired_sessions_keeps_live_sessions() {
        let connection = get_db_connection();
        let live = create_session(None, Duration::minutes(5), &connection).unwrap();
        connection
            .execute(
                "INSERT INTO session (token_hash, csrf_token, expires_at) VALUES ('a', 'b', 0)",
                (),
            )
            .unwrap();

        let deleted = delete_expired_sessions(&connection).unwrap();

        assert_eq!(deleted, 1);
        assert!(find_session(&live.token, &connection).unwrap().is_some());
    }

    #[test]
    fn extend_session_moves_expiry_forward() {
        let connection = get_db_connection();
        let new_session = create_session(None, Duration::minutes(1), &connection).unwrap();

        let expires_at =
            extend_session(new_session.session.id, Duration::minutes(60), &connection).unwrap();

        assert!(expires_at > new_session.session.expires_at);
        let found = find_session(&new_session.token, &connection).unwrap().unwrap();
        assert_eq!(found.expires_at, expires_at);
    }

    #[test]
    fn delete_session_removes_it() {
        let connection = get_db_connection();
        let new_session = create_session(None, Duration::minutes(5), &connection).unwrap();

        delete_session(new_session.session.id, &connection).unwrap();

        assert_eq!(find_session(&new_session.token, &connection).unwrap(), None);
    }
}
