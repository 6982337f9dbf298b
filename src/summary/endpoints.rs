//! The JSON endpoints that expose the dashboard metrics.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    summary::{CategorySpending, MonthlyTotals, RecentTransaction, SummaryService, Totals},
    timestamp::serde_date,
    timezone::local_now,
};

/// How many transactions the dashboard lists.
pub const DASHBOARD_RECENT_LIMIT: u32 = 10;
/// How many categories the dashboard ranks.
pub const DASHBOARD_TOP_CATEGORIES_LIMIT: u32 = 4;

/// The state needed to read the dashboard metrics.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The database connection for computing metrics.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The cached metric reader.
    pub summary: SummaryService,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            summary: state.summary.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Everything the dashboard shows.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Dashboard {
    /// The latest transactions, newest first.
    pub recent_transactions: Vec<RecentTransaction>,
    /// The years with at least one transaction, newest first.
    pub years: Vec<i32>,
    /// The categories with the largest expense.
    pub top_categories: Vec<CategorySpending>,
}

/// Get the dashboard metrics for the logged in user.
pub async fn get_dashboard(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Dashboard>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let recent_transactions =
        state
            .summary
            .recent_transactions(user_id, DASHBOARD_RECENT_LIMIT, &connection)?;
    let years = state.summary.transaction_years(user_id, &connection)?;
    let top_categories = state.summary.top_spending_categories(
        user_id,
        DASHBOARD_TOP_CATEGORIES_LIMIT,
        &connection,
    )?;

    Ok(Json(Dashboard {
        recent_transactions,
        years,
        top_categories,
    }))
}

/// The query string for [get_year_to_date].
#[derive(Debug, Deserialize)]
pub struct YearQuery {
    /// The calendar year, the current local year if omitted.
    pub year: Option<i32>,
}

/// The monthly breakdown of one year.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct YearToDate {
    /// The year the months belong to.
    pub year: i32,
    /// Income and expense for each month with transactions.
    pub months: Vec<MonthlyTotals>,
}

/// Get the logged in user's income and expense per month of a year.
pub async fn get_year_to_date(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<YearQuery>,
) -> Result<Json<YearToDate>, Error> {
    let year = match query.year {
        Some(year) => year,
        None => local_now(&state.local_timezone)
            .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?
            .year(),
    };

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let months = state.summary.monthly_summary(user_id, year, &connection)?;

    Ok(Json(YearToDate { year, months }))
}

/// The query string for [get_totals].
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    /// The first day of the range.
    #[serde(with = "serde_date")]
    pub start: Date,
    /// The last day of the range, inclusive.
    #[serde(with = "serde_date")]
    pub end: Date,
}

/// Get income, expense and net between two dates.
///
/// # Errors
///
/// Returns [Error::InvalidDateRange] if `start` is after `end`.
pub async fn get_totals(
    State(state): State<SummaryState>,
    Query(range): Query<DateRangeQuery>,
) -> Result<Json<Totals>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    state
        .summary
        .totals(range.start, range.end, &connection)
        .map(Json)
}
