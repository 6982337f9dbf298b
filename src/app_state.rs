//! The state shared by every request handler and how it is set up at start up.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, auth::DEFAULT_COOKIE_DURATION, cache::Cache, db::initialize, summary::SummaryService,
    timezone::get_local_offset,
};

/// The state shared by every request handler.
///
/// Handlers pick out the parts they need with [FromRef].
#[derive(Debug, Clone)]
pub struct AppState {
    /// Encrypts the session cookies.
    pub cookie_key: Key,

    /// How long a session lasts without activity.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The application database.
    pub db_connection: Arc<Mutex<Connection>>,

    /// Computes the dashboard metrics and caches them per user.
    pub summary: SummaryService,
}

impl AppState {
    /// Create the tables behind `db_connection` and share `cache` between all handlers.
    ///
    /// # Errors
    ///
    /// Returns a:
    /// - [Error::InvalidTimezoneError] if `local_timezone` is not a canonical timezone name,
    /// - [Error::SqlError] if the tables could not be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        cache: Arc<dyn Cache>,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
            summary: SummaryService::new(cache),
        })
    }

    /// Let sessions last `duration` without activity instead of [DEFAULT_COOKIE_DURATION].
    pub fn with_cookie_duration(mut self, duration: Duration) -> Self {
        self.cookie_duration = duration;
        self
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the session cookie key from `secret`.
///
/// The same secret always gives the same key, so sessions outlive a restart.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret.as_bytes()))
}

#[cfg(test)]
mod app_state_tests {
    use std::sync::Arc;

    use axum::extract::FromRef;
    use rusqlite::Connection;
    use time::Duration;

    use crate::{
        Error,
        auth::{AuthState, DEFAULT_COOKIE_DURATION},
        cache::MemoryCache,
    };

    use super::{AppState, create_cookie_key};

    fn new_state(timezone: &str) -> Result<AppState, Error> {
        AppState::new(
            Connection::open_in_memory().unwrap(),
            "42",
            timezone,
            Arc::new(MemoryCache::default()),
        )
    }

    #[test]
    fn unknown_timezone_is_rejected_at_start_up() {
        let result = new_state("Middle/Earth");

        assert!(matches!(
            result,
            Err(Error::InvalidTimezoneError(name)) if name == "Middle/Earth"
        ));
    }

    #[test]
    fn new_creates_tables() {
        let state = new_state("Pacific/Auckland").unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('user', 'category', 'transaction', 'receipt')",
                (),
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 4);
    }

    #[test]
    fn cookie_duration_reaches_handler_state() {
        let state = new_state("Etc/UTC").unwrap();
        assert_eq!(state.cookie_duration, DEFAULT_COOKIE_DURATION);

        let state = state.with_cookie_duration(Duration::hours(2));
        let auth_state = AuthState::from_ref(&state);

        assert_eq!(auth_state.cookie_duration, Duration::hours(2));
    }

    #[test]
    fn cookie_key_depends_only_on_secret() {
        assert_eq!(
            create_cookie_key("secret").master(),
            create_cookie_key("secret").master()
        );
        assert_ne!(
            create_cookie_key("secret").master(),
            create_cookie_key("other secret").master()
        );
    }
}
