//! Transactions: the model, the database functions and the JSON endpoints.
//!
//! Writes through the endpoints keep the cached dashboard metrics fresh by
//! invalidating the affected years.

mod core;
mod endpoints;

pub use core::{
    Transaction, TransactionBuilder, create_transaction, create_transaction_table,
    delete_transaction, get_transaction, toggle_reviewed, update_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
    toggle_reviewed_endpoint, update_transaction_endpoint,
};
