//! Email verification links.
//!
//! A link has the form `/api/verify/{user_id}/{hash}` where `hash` is the hex
//! encoded SHA-256 digest of the user's email address. The link only works for
//! the user that is logged in.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id, verify_user},
};

/// The state needed to verify a user's email address.
#[derive(Debug, Clone)]
pub struct VerifyState {
    /// The database connection for updating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for VerifyState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The hash embedded in the verification link for `email`.
pub fn verification_hash(email: &EmailAddress) -> String {
    format!("{:x}", Sha256::digest(email.as_str().as_bytes()))
}

/// The verification status returned to the client.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VerificationStatus {
    /// The verified user.
    pub user_id: UserID,
    /// When the user was verified, in RFC 3339 format.
    pub verified_at: Option<String>,
}

/// Mark the logged in user as verified.
///
/// # Errors
///
/// Returns [Error::VerificationFailed] if `link_user_id` is not the logged in
/// user or `hash` does not match their email address.
pub async fn get_verify_email(
    State(state): State<VerifyState>,
    Extension(user_id): Extension<UserID>,
    Path((link_user_id, hash)): Path<(i64, String)>,
) -> Result<Json<VerificationStatus>, Error> {
    if link_user_id != user_id.as_i64() {
        return Err(Error::VerificationFailed);
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let user = get_user_by_id(user_id, &connection)?;

    if !verification_hash(&user.email).eq_ignore_ascii_case(&hash) {
        return Err(Error::VerificationFailed);
    }

    let user = verify_user(user_id, &connection)?;

    Ok(Json(VerificationStatus {
        user_id,
        verified_at: user
            .verified_at
            .and_then(|verified_at| verified_at.format(&Rfc3339).ok()),
    }))
}

#[cfg(test)]
mod verify_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::Path, extract::State};
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{
            PasswordHash, User, create_user,
            verify::{VerifyState, get_verify_email, verification_hash},
        },
        db::initialize,
    };

    fn get_state_and_user() -> (VerifyState, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "test@test.com".parse().unwrap(),
            PasswordHash::from_stored("hunter2".to_owned()),
            &connection,
        )
        .unwrap();

        (
            VerifyState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user,
        )
    }

    #[test]
    fn verification_hash_is_hex_sha256() {
        let hash = verification_hash(&"test@test.com".parse().unwrap());

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn valid_link_verifies_user() {
        let (state, user) = get_state_and_user();
        let hash = verification_hash(&user.email);

        let status = get_verify_email(
            State(state),
            Extension(user.id),
            Path((user.id.as_i64(), hash)),
        )
        .await
        .unwrap();

        assert_eq!(status.user_id, user.id);
        assert!(status.verified_at.is_some());
    }

    #[tokio::test]
    async fn link_for_other_user_fails() {
        let (state, user) = get_state_and_user();
        let hash = verification_hash(&user.email);

        let result = get_verify_email(
            State(state),
            Extension(user.id),
            Path((user.id.as_i64() + 1, hash)),
        )
        .await;

        assert_eq!(result.err(), Some(Error::VerificationFailed));
    }

    #[tokio::test]
    async fn wrong_hash_fails() {
        let (state, user) = get_state_and_user();

        let result = get_verify_email(
            State(state),
            Extension(user.id),
            Path((user.id.as_i64(), "deadbeef".to_owned())),
        )
        .await;

        assert_eq!(result.err(), Some(Error::VerificationFailed));
    }
}
