#![allow(missing_docs)]

pub(crate) mod http;

use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, UserID, create_user},
    db::initialize,
};

pub(crate) use http::{assert_status, parse_json_body};

/// An in-memory database with every table created.
#[track_caller]
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("could not open in-memory database");
    initialize(&connection).expect("could not initialize database");

    connection
}

/// Insert a user with a dummy password hash and return its ID.
#[track_caller]
pub(crate) fn create_test_user(connection: &Connection, email: &str) -> UserID {
    let email = email.parse().expect("invalid test email");

    create_user(email, PasswordHash::from_stored("hunter2".to_owned()), connection)
        .expect("could not create test user")
        .id
}
