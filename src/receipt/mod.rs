//! Receipt metadata attached to transactions.

mod db;
mod domain;
mod endpoints;

pub use db::{create_receipt, create_receipt_table, delete_receipt, get_receipts_for_transaction};
pub use domain::{Receipt, ReceiptData, storage_filename};
pub use endpoints::{create_receipt_endpoint, delete_receipt_endpoint, get_receipts_endpoint};

#[cfg(test)]
pub use db::get_receipt;
