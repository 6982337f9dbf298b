//! Database operations for receipts.
//!
//! Receipts are owned through their transaction, so every query joins on the
//! transaction's user.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    database_id::{ReceiptId, TransactionId},
    receipt::{Receipt, ReceiptData, storage_filename},
    transaction::get_transaction,
};

const COLUMNS: &str = "id, transaction_id, filename, storage_filename, media_type, created_at";

/// Record a receipt for one of the user's transactions.
///
/// # Errors
///
/// Returns [Error::InvalidReceipt] if `data` breaks the receipt rules and
/// [Error::NotFound] if the transaction is not one of the user's.
pub fn create_receipt(
    user_id: UserID,
    transaction_id: TransactionId,
    data: ReceiptData,
    connection: &Connection,
) -> Result<Receipt, Error> {
    data.validate()?;
    get_transaction(user_id, transaction_id, connection)?;

    let created_at = OffsetDateTime::now_utc();
    let storage_filename = storage_filename(transaction_id, &data, created_at);

    let receipt = connection
        .prepare(&format!(
            "INSERT INTO receipt (transaction_id, filename, storage_filename, media_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING {COLUMNS}"
        ))?
        .query_row(
            (
                transaction_id,
                &data.filename,
                &storage_filename,
                &data.media_type,
                created_at,
            ),
            map_row,
        )?;

    Ok(receipt)
}

/// Retrieve one of the user's receipts.
pub fn get_receipt(
    user_id: UserID,
    receipt_id: ReceiptId,
    connection: &Connection,
) -> Result<Receipt, Error> {
    let receipt = connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM receipt
             WHERE id = ?1
             AND transaction_id IN (SELECT id FROM \"transaction\" WHERE user_id = ?2)"
        ))?
        .query_row((receipt_id, user_id.as_i64()), map_row)?;

    Ok(receipt)
}

/// The receipts of one of the user's transactions, oldest first.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction is not one of the user's.
pub fn get_receipts_for_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<Receipt>, Error> {
    get_transaction(user_id, transaction_id, connection)?;

    connection
        .prepare(&format!(
            "SELECT {COLUMNS} FROM receipt WHERE transaction_id = ?1 ORDER BY created_at, id"
        ))?
        .query_map([transaction_id], map_row)?
        .map(|maybe_receipt| maybe_receipt.map_err(Error::from))
        .collect()
}

/// Delete one of the user's receipts and return it.
///
/// # Errors
///
/// Returns [Error::DeleteMissingReceipt] if the receipt is not one of the user's.
pub fn delete_receipt(
    user_id: UserID,
    receipt_id: ReceiptId,
    connection: &Connection,
) -> Result<Receipt, Error> {
    connection
        .prepare(&format!(
            "DELETE FROM receipt
             WHERE id = ?1
             AND transaction_id IN (SELECT id FROM \"transaction\" WHERE user_id = ?2)
             RETURNING {COLUMNS}"
        ))?
        .query_row((receipt_id, user_id.as_i64()), map_row)
        .optional()?
        .ok_or(Error::DeleteMissingReceipt)
}

/// Create the receipt table in the database.
pub fn create_receipt_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS receipt (
            id INTEGER PRIMARY KEY,
            transaction_id INTEGER NOT NULL,
            filename TEXT NOT NULL,
            storage_filename TEXT NOT NULL,
            media_type TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON UPDATE CASCADE ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_receipt_transaction ON receipt(transaction_id);",
    )
}

fn map_row(row: &Row) -> Result<Receipt, rusqlite::Error> {
    Ok(Receipt {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        filename: row.get(2)?,
        storage_filename: row.get(3)?,
        media_type: row.get(4)?,
        created_at: row.get(5)?,
    })
}

#[cfg(test)]
mod receipt_query_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        Error,
        auth::UserID,
        receipt::{
            ReceiptData, create_receipt, delete_receipt, get_receipt, get_receipts_for_transaction,
        },
        test_utils::{create_test_user, get_test_connection},
        transaction::{Transaction, create_transaction, delete_transaction},
    };

    fn get_test_db() -> (Connection, UserID, i64) {
        let connection = get_test_connection();
        let user_id = create_test_user(&connection, "test@test.com");
        let transaction = create_transaction(
            user_id,
            Transaction::build(Decimal::from(-20), datetime!(2024-01-01 12:00), "test"),
            &connection,
        )
        .unwrap();

        (connection, user_id, transaction.id)
    }

    fn pdf(filename: &str) -> ReceiptData {
        ReceiptData {
            filename: filename.to_owned(),
            media_type: "application/pdf".to_owned(),
            size: 1024,
        }
    }

    #[test]
    fn create_and_get_receipt() {
        let (connection, user_id, transaction_id) = get_test_db();

        let receipt = create_receipt(user_id, transaction_id, pdf("scan.pdf"), &connection)
            .expect("could not create receipt");

        assert_eq!(receipt.transaction_id, transaction_id);
        assert_eq!(receipt.filename, "scan.pdf");
        assert!(receipt.storage_filename.ends_with(".pdf"));
        assert_eq!(get_receipt(user_id, receipt.id, &connection), Ok(receipt));
    }

    #[test]
    fn create_rejects_invalid_receipt() {
        let (connection, user_id, transaction_id) = get_test_db();

        let result = create_receipt(user_id, transaction_id, pdf("bad/name.pdf"), &connection);

        assert!(matches!(result, Err(Error::InvalidReceipt(_))));
    }

    #[test]
    fn cannot_attach_receipt_to_another_users_transaction() {
        let (connection, _, transaction_id) = get_test_db();
        let other_user = create_test_user(&connection, "other@test.com");

        let result = create_receipt(other_user, transaction_id, pdf("scan.pdf"), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn list_receipts_for_transaction() {
        let (connection, user_id, transaction_id) = get_test_db();
        let first = create_receipt(user_id, transaction_id, pdf("a.pdf"), &connection).unwrap();
        let second = create_receipt(user_id, transaction_id, pdf("b.pdf"), &connection).unwrap();

        let receipts = get_receipts_for_transaction(user_id, transaction_id, &connection);

        assert_eq!(receipts, Ok(vec![first, second]));
    }

    #[test]
    fn other_users_cannot_list_or_delete_receipts() {
        let (connection, user_id, transaction_id) = get_test_db();
        let other_user = create_test_user(&connection, "other@test.com");
        let receipt = create_receipt(user_id, transaction_id, pdf("a.pdf"), &connection).unwrap();

        assert_eq!(
            get_receipts_for_transaction(other_user, transaction_id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            get_receipt(other_user, receipt.id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_receipt(other_user, receipt.id, &connection),
            Err(Error::DeleteMissingReceipt)
        );
    }

    #[test]
    fn delete_receipt_succeeds_once() {
        let (connection, user_id, transaction_id) = get_test_db();
        let receipt = create_receipt(user_id, transaction_id, pdf("a.pdf"), &connection).unwrap();

        assert_eq!(
            delete_receipt(user_id, receipt.id, &connection),
            Ok(receipt.clone())
        );
        assert_eq!(
            delete_receipt(user_id, receipt.id, &connection),
            Err(Error::DeleteMissingReceipt)
        );
    }

    #[test]
    fn deleting_transaction_deletes_receipts() {
        let (connection, user_id, transaction_id) = get_test_db();
        let receipt = create_receipt(user_id, transaction_id, pdf("a.pdf"), &connection).unwrap();

        delete_transaction(user_id, transaction_id, &connection).unwrap();

        assert_eq!(
            get_receipt(user_id, receipt.id, &connection),
            Err(Error::NotFound)
        );
    }
}
