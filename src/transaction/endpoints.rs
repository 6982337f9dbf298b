//! The JSON endpoints for reading and writing a user's transactions.
//!
//! Creating, updating and deleting a transaction drops the cached metrics for
//! the affected year. Toggling the reviewed flag does not change any metric.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::{CategoryId, TransactionId},
    summary::SummaryService,
    timestamp::serde_timestamp,
    timezone::local_now,
    transaction::{
        Transaction, TransactionBuilder, create_transaction, delete_transaction, get_transaction,
        toggle_reviewed, update_transaction,
    },
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Invalidates cached metrics after a write.
    pub summary: SummaryService,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            summary: state.summary.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating or updating a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionData {
    /// The signed amount, negative for expenses.
    pub amount: Decimal,
    /// When the transaction happened, e.g. "2024-01-15 09:30:00" or "2024-01-15".
    #[serde(with = "serde_timestamp")]
    pub date: PrimitiveDateTime,
    /// Text detailing the transaction.
    pub description: String,
    /// One of the user's categories.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Whether the transaction starts out reviewed. Ignored on update.
    #[serde(default)]
    pub reviewed: bool,
}

impl TransactionData {
    /// Reject dates after the current time in `local_timezone`.
    fn into_builder(self, local_timezone: &str) -> Result<TransactionBuilder, Error> {
        let Some(now) = local_now(local_timezone) else {
            tracing::error!("Invalid timezone {local_timezone}");
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        };

        if self.date > now {
            return Err(Error::FutureDate(self.date));
        }

        Ok(Transaction::build(self.amount, self.date, &self.description)
            .category_id(self.category_id)
            .reviewed(self.reviewed))
    }
}

/// Create a transaction for the logged in user.
///
/// # Errors
///
/// Returns [Error::FutureDate] if the date is in the future and
/// [Error::InvalidCategory] if the category is not one of the user's.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<TransactionData>,
) -> Result<Response, Error> {
    let builder = data.into_builder(&state.local_timezone)?;

    let transaction = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        create_transaction(user_id, builder, &connection)?
    };

    state
        .summary
        .invalidate_transaction(user_id, &[transaction.date.year()]);

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

/// Get one of the logged in user's transactions.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transaction(user_id, transaction_id, &connection).map(Json)
}

/// Overwrite one of the logged in user's transactions.
///
/// If the new date is in another year than the old one, the cached metrics of
/// both years are dropped.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(data): Json<TransactionData>,
) -> Result<Json<Transaction>, Error> {
    let builder = data.into_builder(&state.local_timezone)?;

    let (old_year, transaction) = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        let old_year = match get_transaction(user_id, transaction_id, &connection) {
            Ok(transaction) => transaction.date.year(),
            Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
            Err(error) => return Err(error),
        };

        (
            old_year,
            update_transaction(user_id, transaction_id, builder, &connection)?,
        )
    };

    state
        .summary
        .invalidate_transaction(user_id, &[old_year, transaction.date.year()]);

    Ok(Json(transaction))
}

/// Delete one of the logged in user's transactions along with its receipts.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let transaction = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        delete_transaction(user_id, transaction_id, &connection)?
    };

    state
        .summary
        .invalidate_transaction(user_id, &[transaction.date.year()]);

    Ok(StatusCode::NO_CONTENT)
}

/// Flip the reviewed flag of one of the logged in user's transactions.
pub async fn toggle_reviewed_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    toggle_reviewed(user_id, transaction_id, &connection).map(Json)
}
