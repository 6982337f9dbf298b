//! The JSON endpoints for a transaction's receipt metadata.
//!
//! Receipts never affect any metric, so nothing here touches the cache.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    database_id::{ReceiptId, TransactionId},
    receipt::{Receipt, ReceiptData, create_receipt, delete_receipt, get_receipts_for_transaction},
};

/// The state needed by the receipt endpoints.
#[derive(Debug, Clone)]
pub struct ReceiptState {
    /// The database connection for managing receipts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReceiptState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the receipts of one of the logged in user's transactions.
pub async fn get_receipts_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Vec<Receipt>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_receipts_for_transaction(user_id, transaction_id, &connection).map(Json)
}

/// Record a receipt for one of the logged in user's transactions.
pub async fn create_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(data): Json<ReceiptData>,
) -> Result<Response, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let receipt = create_receipt(user_id, transaction_id, data, &connection)?;
    tracing::info!(
        "recorded receipt {} for transaction {transaction_id}",
        receipt.id
    );

    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

/// Delete one of the logged in user's receipts.
pub async fn delete_receipt_endpoint(
    State(state): State<ReceiptState>,
    Extension(user_id): Extension<UserID>,
    Path(receipt_id): Path<ReceiptId>,
) -> Result<StatusCode, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_receipt(user_id, receipt_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod receipt_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rust_decimal::Decimal;
    use serde_json::Value;
    use time::macros::datetime;

    use crate::{
        auth::UserID,
        receipt::{Receipt, ReceiptData},
        test_utils::{assert_status, create_test_user, get_test_connection, parse_json_body},
        transaction::{Transaction, create_transaction},
    };

    use super::{
        ReceiptState, create_receipt_endpoint, delete_receipt_endpoint, get_receipts_endpoint,
    };

    fn get_state() -> (ReceiptState, UserID, i64) {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection, "test@test.com");
        let transaction = create_transaction(
            user_id,
            Transaction::build(Decimal::from(-20), datetime!(2024-01-01 12:00), "test"),
            &connection,
        )
        .unwrap();

        let state = ReceiptState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, user_id, transaction.id)
    }

    fn png() -> Json<ReceiptData> {
        Json(ReceiptData {
            filename: "lunch.png".to_owned(),
            media_type: "image/png".to_owned(),
            size: 2048,
        })
    }

    #[tokio::test]
    async fn create_then_list_receipts() {
        let (state, user_id, transaction_id) = get_state();

        let response = create_receipt_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction_id),
            png(),
        )
        .await
        .into_response();
        assert_status(&response, StatusCode::CREATED);
        let created: Receipt = parse_json_body(response).await;

        let Json(receipts) =
            get_receipts_endpoint(State(state), Extension(user_id), Path(transaction_id))
                .await
                .unwrap();

        assert_eq!(receipts, vec![created]);
    }

    #[tokio::test]
    async fn invalid_receipt_is_bad_request() {
        let (state, user_id, transaction_id) = get_state();
        let Json(mut data) = png();
        data.media_type = "text/html".to_owned();

        let response = create_receipt_endpoint(
            State(state),
            Extension(user_id),
            Path(transaction_id),
            Json(data),
        )
        .await
        .into_response();

        assert_status(&response, StatusCode::BAD_REQUEST);
        let body: Value = parse_json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("invalid receipt"));
    }

    #[tokio::test]
    async fn delete_receipt_then_missing() {
        let (state, user_id, transaction_id) = get_state();
        let response = create_receipt_endpoint(
            State(state.clone()),
            Extension(user_id),
            Path(transaction_id),
            png(),
        )
        .await
        .into_response();
        let created: Receipt = parse_json_body(response).await;

        let status =
            delete_receipt_endpoint(State(state.clone()), Extension(user_id), Path(created.id))
                .await
                .unwrap();
        let response = delete_receipt_endpoint(State(state), Extension(user_id), Path(created.id))
            .await
            .into_response();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_status(&response, StatusCode::NOT_FOUND);
    }
}
