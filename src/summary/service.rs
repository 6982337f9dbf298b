//! Read-through caching of the dashboard metrics.

use std::{sync::Arc, time::Duration};

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    cache::{Cache, CacheKey, CachedMetric, MetricKind},
    summary::{CategorySpending, MonthlyTotals, RecentTransaction, Totals, queries},
};

/// How long a computed metric is served from the cache.
pub const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Computes per-user metrics, serving them from the cache when possible.
///
/// A cache that fails is logged and bypassed: callers always get a value
/// computed from the database, and a failed computation never writes to the
/// cache.
#[derive(Debug, Clone)]
pub struct SummaryService {
    pub(super) cache: Arc<dyn Cache>,
}

impl SummaryService {
    /// Create a service that stores metrics in `cache`.
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// The user's latest `limit` transactions, newest first.
    pub fn recent_transactions(
        &self,
        user_id: UserID,
        limit: u32,
        connection: &Connection,
    ) -> Result<Vec<RecentTransaction>, Error> {
        self.read_through(
            CacheKey::new(user_id, MetricKind::RecentTransactions),
            |cached| match cached {
                CachedMetric::RecentTransactions {
                    limit: cached_limit,
                    rows,
                } if cached_limit == limit => Some(rows),
                _ => None,
            },
            || queries::recent_transactions(user_id, limit, connection),
            |rows| CachedMetric::RecentTransactions { limit, rows },
        )
    }

    /// Income and expense per month of `year`, months without transactions left out.
    pub fn monthly_summary(
        &self,
        user_id: UserID,
        year: i32,
        connection: &Connection,
    ) -> Result<Vec<MonthlyTotals>, Error> {
        self.read_through(
            CacheKey::new(user_id, MetricKind::MonthlyTotals { year }),
            |cached| match cached {
                CachedMetric::MonthlyTotals(rows) => Some(rows),
                _ => None,
            },
            || queries::monthly_summary(user_id, year, connection),
            CachedMetric::MonthlyTotals,
        )
    }

    /// Income, expense and net between `start` and `end`, both inclusive.
    ///
    /// This is always read from the database.
    pub fn totals(&self, start: Date, end: Date, connection: &Connection) -> Result<Totals, Error> {
        queries::totals(start, end, connection)
    }

    /// The user's `limit` categories with the largest total expense.
    pub fn top_spending_categories(
        &self,
        user_id: UserID,
        limit: u32,
        connection: &Connection,
    ) -> Result<Vec<CategorySpending>, Error> {
        self.read_through(
            CacheKey::new(user_id, MetricKind::TopCategories),
            |cached| match cached {
                CachedMetric::TopCategories {
                    limit: cached_limit,
                    rows,
                } if cached_limit == limit => Some(rows),
                _ => None,
            },
            || queries::top_spending_categories(user_id, limit, connection),
            |rows| CachedMetric::TopCategories { limit, rows },
        )
    }

    /// The years in which the user has transactions, newest first.
    pub fn transaction_years(
        &self,
        user_id: UserID,
        connection: &Connection,
    ) -> Result<Vec<i32>, Error> {
        self.read_through(
            CacheKey::new(user_id, MetricKind::TransactionYears),
            |cached| match cached {
                CachedMetric::TransactionYears(years) => Some(years),
                _ => None,
            },
            || queries::distinct_transaction_years(user_id, connection),
            CachedMetric::TransactionYears,
        )
    }

    /// Return the cached value for `key` if `from_cache` accepts it, otherwise
    /// `compute` the value and cache it for [CACHE_TTL].
    fn read_through<T: Clone>(
        &self,
        key: CacheKey,
        from_cache: impl FnOnce(CachedMetric) -> Option<T>,
        compute: impl FnOnce() -> Result<T, Error>,
        to_cache: impl FnOnce(T) -> CachedMetric,
    ) -> Result<T, Error> {
        match self.cache.get(&key) {
            Ok(Some(cached)) => match from_cache(cached) {
                Some(value) => {
                    tracing::debug!("cache hit for {key}");
                    return Ok(value);
                }
                None => tracing::debug!("cached {key} does not match the request, recomputing"),
            },
            Ok(None) => tracing::debug!("cache miss for {key}"),
            Err(error) => tracing::warn!("could not read {key} from the cache: {error}"),
        }

        let value = compute()?;

        if let Err(error) = self.cache.set(key, to_cache(value.clone()), CACHE_TTL) {
            tracing::warn!("could not write {key} to the cache: {error}");
        }

        Ok(value)
    }
}
