//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash, db::SQL_NOW};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email the user registered with, as it was entered.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// An optional name to greet the user with.
    pub display_name: Option<String>,
    /// When the user registered, as an RFC 3339 timestamp.
    pub created_at: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                display_name TEXT,
                created_at TEXT NOT NULL DEFAULT ({SQL_NOW})
                )"
        ),
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns an [Error::DuplicateEmail] if the email is already registered, or
/// an [Error::Sql] if another SQL related error occurred.
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    display_name: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, password_hash, display_name) VALUES (?1, ?2, ?3)",
        (email, password_hash.as_ref(), display_name),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    get_user_by_id(id, connection)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, email, password_hash, display_name, created_at FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Find the user registered with exactly `email`, if any.
///
/// # Errors
///
/// Returns an [Error::Sql] if an SQL related error occurred.
pub fn find_user_by_email(email: &str, connection: &Connection) -> Result<Option<User>, Error> {
    connection
        .prepare(
            "SELECT id, email, password_hash, display_name, created_at
            FROM user WHERE email = :email",
        )?
        .query_row(&[(":email", &email)], map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Replace a user's password hash and display name.
///
/// # Errors
///
/// Returns [Error::NOT_FOUND] if the user does not exist, or an [Error::Sql] if
/// an SQL related error occurred.
pub fn update_credentials(
    user_id: UserID,
    password_hash: &PasswordHash,
    display_name: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password_hash = ?1, display_name = ?2 WHERE id = ?3",
        (password_hash.as_ref(), display_name, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NOT_FOUND);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        display_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}
