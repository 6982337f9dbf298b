//! Dashboard metrics: the aggregation queries, the per-user read-through cache
//! in front of them, and the invalidation hooks called after writes.

mod endpoints;
mod invalidation;
mod models;
mod queries;
mod service;

pub use endpoints::{get_dashboard, get_totals, get_year_to_date};
pub use models::{CategorySpending, MonthlyTotals, RecentTransaction, Totals};
pub use service::{CACHE_TTL, SummaryService};
