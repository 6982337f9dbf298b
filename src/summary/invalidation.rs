//! Dropping cached metrics after writes.
//!
//! Invalidation runs after the write has been committed. If the cache cannot
//! be cleared the error is logged and the write still counts as successful.

use crate::{
    auth::UserID,
    cache::{CacheKey, MetricKind},
    summary::SummaryService,
};

/// The metrics a transaction dated in `year` contributes to.
pub fn transaction_keys(user_id: UserID, year: i32) -> [CacheKey; 4] {
    [
        CacheKey::new(user_id, MetricKind::MonthlyTotals { year }),
        CacheKey::new(user_id, MetricKind::TopCategories),
        CacheKey::new(user_id, MetricKind::TransactionYears),
        CacheKey::new(user_id, MetricKind::RecentTransactions),
    ]
}

/// The metrics grouped by category.
///
/// Recent transactions also show category names but are left alone, so a
/// rename shows up there once the entry expires after [CACHE_TTL](crate::summary::CACHE_TTL).
pub fn category_keys(user_id: UserID) -> [CacheKey; 1] {
    [CacheKey::new(user_id, MetricKind::TopCategories)]
}

impl SummaryService {
    /// Drop the user's cached metrics affected by a transaction write.
    ///
    /// `years` holds the year of the transaction's date, plus the previous
    /// year when an update moved it to another year.
    pub fn invalidate_transaction(&self, user_id: UserID, years: &[i32]) {
        let mut keys: Vec<CacheKey> = Vec::with_capacity(years.len() + 3);

        for &year in years {
            for key in transaction_keys(user_id, year) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        self.delete_keys(&keys);
    }

    /// Drop the user's cached metrics affected by a category write.
    ///
    /// Only the top categories are dropped. Cached recent transactions keep
    /// showing the old category name for up to [CACHE_TTL](crate::summary::CACHE_TTL).
    pub fn invalidate_categories(&self, user_id: UserID) {
        self.delete_keys(&category_keys(user_id));
    }

    fn delete_keys(&self, keys: &[CacheKey]) {
        match self.cache.delete_multiple(keys) {
            Ok(()) => tracing::debug!("invalidated {} cached metrics", keys.len()),
            Err(error) => tracing::error!("could not invalidate cached metrics: {error}"),
        }
    }
}
