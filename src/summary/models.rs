//! The result schema of each dashboard metric.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use crate::timestamp::serde_timestamp;

/// A transaction as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTransaction {
    /// What the transaction was for.
    pub description: String,
    /// The signed amount.
    pub amount: Decimal,
    /// When the transaction happened.
    #[serde(with = "serde_timestamp")]
    pub date: PrimitiveDateTime,
    /// The name of the transaction's category, `None` if uncategorised.
    pub category_name: Option<String>,
}

/// Income and expense for one month of a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// The month number, 1 to 12.
    pub month: u8,
    /// The sum of positive amounts.
    pub income: Decimal,
    /// The magnitude of the sum of negative amounts.
    pub expense: Decimal,
}

/// Income, expense and net over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// The sum of positive amounts.
    pub income: Decimal,
    /// The sum of negative amounts. This is zero or negative.
    pub expense: Decimal,
    /// `income + expense`.
    pub net: Decimal,
}

/// The total expense of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    /// The category name, `None` for uncategorised transactions.
    pub category_name: Option<String>,
    /// The sum of the category's negative amounts.
    pub total: Decimal,
}
