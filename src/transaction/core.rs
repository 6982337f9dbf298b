//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, OptionalExtension, Row, named_params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::{
    Error,
    amount::{amount_to_sql, read_amount},
    auth::UserID,
    database_id::{CategoryId, TransactionId},
    timestamp::{format_timestamp, read_timestamp, serde_timestamp, truncate_to_microseconds},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent (negative) or earned (positive).
    pub amount: Decimal,
    /// When the transaction happened, to the microsecond.
    #[serde(with = "serde_timestamp")]
    pub date: PrimitiveDateTime,
    /// Whether the user has checked the transaction.
    pub reviewed: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: Decimal, date: PrimitiveDateTime, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date: truncate_to_microseconds(date),
            description: description.to_owned(),
            category_id: None,
            reviewed: false,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use rust_decimal::Decimal;
/// use time::macros::datetime;
///
/// use crate::transaction::Transaction;
///
/// let builder = Transaction::build(
///         Decimal::new(-4599, 2),
///         datetime!(2025-01-15 08:30),
///         "Coffee shop purchase",
///     )
///     .category_id(Some(3));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income, negative values represent expenses.
    /// Zero counts as neither.
    pub amount: Decimal,

    /// When the transaction occurred, truncated to microseconds.
    pub date: PrimitiveDateTime,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,

    /// Whether the transaction starts out reviewed. Only used on creation.
    pub reviewed: bool,
}

impl TransactionBuilder {
    /// Set the category id for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set whether the transaction has been reviewed.
    pub fn reviewed(mut self, reviewed: bool) -> Self {
        self.reviewed = reviewed;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const RETURNING_COLUMNS: &str = "id, user_id, category_id, description, amount, date, reviewed";

/// Create a new transaction for `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to one of the user's categories,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_category_owner(user_id, builder.category_id, connection)?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (user_id, category_id, description, amount, date, reviewed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {RETURNING_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                builder.category_id,
                &builder.description,
                amount_to_sql(&builder.amount),
                format_timestamp(builder.date),
                builder.reviewed,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {RETURNING_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            named_params! { ":id": id, ":user_id": user_id.as_i64() },
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Overwrite the amount, date, description and category of a transaction.
///
/// The reviewed flag is left as is, use [toggle_reviewed] to change it.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - [Error::InvalidCategory] if the category ID does not refer to one of the user's categories,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_category_owner(user_id, builder.category_id, connection)?;

    connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET category_id = ?1, description = ?2, amount = ?3, date = ?4
             WHERE id = ?5 AND user_id = ?6
             RETURNING {RETURNING_COLUMNS}"
        ))?
        .query_row(
            (
                builder.category_id,
                &builder.description,
                amount_to_sql(&builder.amount),
                format_timestamp(builder.date),
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )
        .optional()?
        .ok_or(Error::UpdateMissingTransaction)
}

/// Delete one of the user's transactions and its receipts.
///
/// Returns the deleted transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2 RETURNING {RETURNING_COLUMNS}"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .optional()?
        .ok_or(Error::DeleteMissingTransaction)
}

/// Flip the reviewed flag of one of the user's transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn toggle_reviewed(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "UPDATE \"transaction\" SET reviewed = NOT reviewed
             WHERE id = ?1 AND user_id = ?2
             RETURNING {RETURNING_COLUMNS}"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .optional()?
        .ok_or(Error::UpdateMissingTransaction)
}

/// The foreign key only checks that a category exists, so ownership is checked here.
fn check_category_owner(
    user_id: UserID,
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(id) = category_id else {
        return Ok(());
    };

    let is_owner = connection
        .prepare("SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2")?
        .exists((id, user_id.as_i64()))?;

    if is_owner {
        Ok(())
    } else {
        Err(Error::InvalidCategory(category_id))
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                category_id INTEGER,
                description TEXT NOT NULL,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                reviewed INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Every summary query filters on the user first, then the date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        description: row.get(3)?,
        amount: read_amount(row, 4)?,
        date: read_timestamp(row, 5)?,
        reviewed: row.get(6)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rust_decimal::Decimal;
    use time::macros::datetime;

    use crate::{
        Error,
        category::{CategoryName, create_category, delete_category},
        test_utils::{create_test_user, get_test_connection},
        transaction::{
            Transaction, create_transaction, delete_transaction, get_transaction,
            toggle_reviewed, update_transaction,
        },
    };

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let amount = Decimal::new(-1230, 2);

        let transaction = create_transaction(
            user_id,
            Transaction::build(amount, datetime!(2025-10-05 12:00), "Lunch"),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.amount, amount);
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(transaction.date, datetime!(2025-10-05 12:00));
        assert!(!transaction.reviewed);
    }

    #[test]
    fn create_keeps_exact_amount_and_microseconds() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let amount: Decimal = "0.1".parse().unwrap();

        let created = create_transaction(
            user_id,
            Transaction::build(amount, datetime!(2025-10-05 12:00:00.123456789), ""),
            &conn,
        )
        .unwrap();
        let fetched = get_transaction(user_id, created.id, &conn).unwrap();

        assert_eq!(fetched.amount, amount);
        assert_eq!(fetched.date, datetime!(2025-10-05 12:00:00.123456));
    }

    #[test]
    fn create_fails_on_missing_category() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let category_id = Some(42);

        let result = create_transaction(
            user_id,
            Transaction::build(Decimal::ONE, datetime!(2025-10-04 00:00), "")
                .category_id(category_id),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(category_id)));
    }

    #[test]
    fn create_fails_on_other_users_category() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let other_user = create_test_user(&conn, "other@test.com");
        let category =
            create_category(other_user, CategoryName::new_unchecked("Food"), &conn).unwrap();

        let result = create_transaction(
            user_id,
            Transaction::build(Decimal::ONE, datetime!(2025-10-04 00:00), "")
                .category_id(Some(category.id)),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(Some(category.id))));
    }

    #[test]
    fn get_other_users_transaction_returns_not_found() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let other_user = create_test_user(&conn, "other@test.com");
        let transaction = create_transaction(
            user_id,
            Transaction::build(Decimal::ONE, datetime!(2025-10-04 00:00), ""),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(other_user, transaction.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_overwrites_fields_but_not_reviewed() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let category =
            create_category(user_id, CategoryName::new_unchecked("Food"), &conn).unwrap();
        let transaction = create_transaction(
            user_id,
            Transaction::build(Decimal::ONE, datetime!(2024-12-31 23:00), "Old").reviewed(true),
            &conn,
        )
        .unwrap();

        let updated = update_transaction(
            user_id,
            transaction.id,
            Transaction::build(Decimal::NEGATIVE_ONE, datetime!(2025-01-01 09:00), "New")
                .category_id(Some(category.id)),
            &conn,
        )
        .unwrap();

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.amount, Decimal::NEGATIVE_ONE);
        assert_eq!(updated.date, datetime!(2025-01-01 09:00));
        assert_eq!(updated.description, "New");
        assert_eq!(updated.category_id, Some(category.id));
        assert!(updated.reviewed);
    }

    #[test]
    fn update_missing_transaction_fails() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");

        let result = update_transaction(
            user_id,
            999,
            Transaction::build(Decimal::ONE, datetime!(2025-01-01 09:00), ""),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_returns_deleted_transaction() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let transaction = create_transaction(
            user_id,
            Transaction::build(Decimal::ONE, datetime!(2025-01-01 09:00), ""),
            &conn,
        )
        .unwrap();

        assert_eq!(
            delete_transaction(user_id, transaction.id, &conn),
            Ok(transaction.clone())
        );
        assert_eq!(
            get_transaction(user_id, transaction.id, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_transaction(user_id, transaction.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }

    #[test]
    fn toggle_reviewed_flips_flag() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let transaction = create_transaction(
            user_id,
            Transaction::build(Decimal::ONE, datetime!(2025-01-01 09:00), ""),
            &conn,
        )
        .unwrap();

        assert!(toggle_reviewed(user_id, transaction.id, &conn).unwrap().reviewed);
        assert!(!toggle_reviewed(user_id, transaction.id, &conn).unwrap().reviewed);
    }

    #[test]
    fn deleting_category_uncategorises_transactions() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn, "test@test.com");
        let category =
            create_category(user_id, CategoryName::new_unchecked("Food"), &conn).unwrap();
        let transaction = create_transaction(
            user_id,
            Transaction::build(Decimal::ONE, datetime!(2025-01-01 09:00), "")
                .category_id(Some(category.id)),
            &conn,
        )
        .unwrap();

        delete_category(user_id, category.id, &conn).unwrap();

        assert_eq!(
            get_transaction(user_id, transaction.id, &conn)
                .unwrap()
                .category_id,
            None
        );
    }
}
