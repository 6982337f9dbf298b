//! Per-user storage for precomputed dashboard metrics.
//!
//! Entries are keyed by a typed [CacheKey] and hold a [CachedMetric]. Every
//! entry expires after the TTL it was written with. The database stays the
//! single source of truth, so any entry may be dropped at any time.

mod memory;

use std::{fmt::Display, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    auth::UserID,
    summary::{CategorySpending, MonthlyTotals, RecentTransaction},
};

pub use memory::MemoryCache;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache store could not be used, e.g. its lock was poisoned.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// The metrics that are cached per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// The latest transactions shown on the dashboard.
    RecentTransactions,
    /// Income and expense per month for one calendar year.
    MonthlyTotals {
        /// The calendar year the totals cover.
        year: i32,
    },
    /// The categories with the largest total expense.
    TopCategories,
    /// The years that have at least one transaction.
    TransactionYears,
}

/// Identifies one cached metric for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// The user the metric was computed for.
    pub user_id: UserID,
    /// Which metric is stored.
    pub metric: MetricKind,
}

impl CacheKey {
    /// Create the key for `metric` scoped to `user_id`.
    pub fn new(user_id: UserID, metric: MetricKind) -> Self {
        Self { user_id, metric }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.metric {
            MetricKind::RecentTransactions => {
                write!(f, "user:{}:recent_transactions", self.user_id)
            }
            MetricKind::MonthlyTotals { year } => {
                write!(f, "user:{}:monthly_totals:{year}", self.user_id)
            }
            MetricKind::TopCategories => write!(f, "user:{}:top_categories", self.user_id),
            MetricKind::TransactionYears => {
                write!(f, "user:{}:transactions_years", self.user_id)
            }
        }
    }
}

/// A precomputed metric.
///
/// The list metrics remember the `limit` they were computed with so a request
/// for a different number of rows is not served a truncated or padded list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachedMetric {
    /// The newest transactions, newest first.
    RecentTransactions {
        /// The maximum number of rows requested when the list was computed.
        limit: u32,
        /// The transactions.
        rows: Vec<RecentTransaction>,
    },
    /// Monthly totals sorted by month, months without transactions absent.
    MonthlyTotals(Vec<MonthlyTotals>),
    /// Categories ranked by total expense.
    TopCategories {
        /// The maximum number of rows requested when the list was computed.
        limit: u32,
        /// The ranked categories.
        rows: Vec<CategorySpending>,
    },
    /// Years with transactions, newest first.
    TransactionYears(Vec<i32>),
}

/// A key-value store for [CachedMetric]s with per-entry expiry.
///
/// Implementations must never return an entry after its TTL has elapsed.
pub trait Cache: Send + Sync + std::fmt::Debug {
    /// Get the live entry for `key`, if any.
    fn get(&self, key: &CacheKey) -> Result<Option<CachedMetric>>;

    /// Whether a live entry exists for `key`.
    fn has(&self, key: &CacheKey) -> Result<bool> {
        self.get(key).map(|value| value.is_some())
    }

    /// Store `value` under `key` for `ttl`, replacing any existing entry and
    /// its expiry.
    fn set(&self, key: CacheKey, value: CachedMetric, ttl: Duration) -> Result<()>;

    /// Remove the entry for `key`. Removing an absent key is not an error.
    fn delete(&self, key: &CacheKey) -> Result<()>;

    /// Remove the entries for all of `keys`.
    fn delete_multiple(&self, keys: &[CacheKey]) -> Result<()> {
        keys.iter().try_for_each(|key| self.delete(key))
    }
}
