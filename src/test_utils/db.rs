use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    PasswordHash,
    db::initialize,
    user::{UserID, create_user},
};

/// An initialized in-memory database.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Wrap a connection the way the app state shares it between requests.
pub(crate) fn shared_connection(connection: Connection) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(connection))
}

/// Insert a user with a placeholder password hash.
pub(crate) fn create_test_user(email: &str, connection: &Connection) -> UserID {
    create_user(
        email,
        PasswordHash::new_unchecked("hunter2"),
        None,
        connection,
    )
    .expect("Could not create test user")
    .id
}
