//! Password strength checks and bcrypt hashing for user accounts.

use bcrypt::{hash, verify};
use zxcvbn::{Score, zxcvbn};

use crate::Error;

/// The weakest zxcvbn score accepted for a new password.
const MIN_PASSWORD_SCORE: Score = Score::Three;

/// The bcrypt cost for stored passwords.
pub const PASSWORD_HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Reject `password` if it is easy to guess.
///
/// `user_inputs`, e.g. the account's email address, make a password weaker
/// when it contains them.
///
/// # Errors
///
/// Returns [Error::TooWeak] carrying zxcvbn's warning and suggestions.
pub fn check_password_strength(password: &str, user_inputs: &[&str]) -> Result<(), Error> {
    let entropy = zxcvbn(password, user_inputs);

    if entropy.score() >= MIN_PASSWORD_SCORE {
        return Ok(());
    }

    let advice = entropy
        .feedback()
        .map(|feedback| {
            feedback
                .warning()
                .map(|warning| warning.to_string())
                .into_iter()
                .chain(feedback.suggestions().iter().map(ToString::to_string))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|advice| !advice.is_empty())
        .unwrap_or_else(|| "Add another word or two.".to_owned());

    Err(Error::TooWeak(advice))
}

/// A bcrypt hash of a user's password, as stored in the user table.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Check that `password` is strong enough for the account `email`, then hash it.
    ///
    /// # Errors
    ///
    /// Returns [Error::TooWeak] for a guessable password or [Error::HashingError]
    /// if bcrypt fails.
    pub fn for_new_password(password: &str, email: &str, cost: u32) -> Result<Self, Error> {
        check_password_strength(password, &[email])?;

        Self::hash_unchecked(password, cost)
    }

    /// Hash `password` without checking its strength, e.g. for seeded accounts.
    pub fn hash_unchecked(password: &str, cost: u32) -> Result<Self, Error> {
        hash(password, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap a hash read back from the user table.
    pub fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    /// The hash in the form it is stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `password` is the password this hash was made from.
    ///
    /// # Errors
    ///
    /// Returns [Error::HashingError] if the stored hash is malformed.
    pub fn matches(&self, password: &str) -> Result<bool, Error> {
        verify(password, &self.0).map_err(|error| Error::HashingError(error.to_string()))
    }
}
