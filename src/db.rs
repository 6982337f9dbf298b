//! Database initialisation.

use rusqlite::Connection;

use crate::{
    auth::create_user_table, category::create_category_table, receipt::create_receipt_table,
    transaction::create_transaction_table,
};

/// Create all the tables and indexes used by the application.
///
/// This function is idempotent: calling it on an already initialised
/// database leaves the existing data untouched.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    // Needed for ON DELETE SET NULL/CASCADE to take effect.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_receipt_table(&transaction)?;

    transaction.commit()
}
