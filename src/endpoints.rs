//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/categories/{category_id}', use [format_endpoint].

/// The route for registering a new user.
pub const USERS: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for confirming a user's email address.
pub const VERIFY_EMAIL: &str = "/api/verify/{user_id}/{hash}";

/// The route for the dashboard summary: recent transactions, years and top categories.
pub const DASHBOARD: &str = "/api/dashboard";
/// The route for the monthly income and expense breakdown of a year.
pub const YEAR_TO_DATE: &str = "/api/stats/ytd";
/// The route for income, expense and net totals over a date range.
pub const TOTALS: &str = "/api/stats/totals";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to rename or delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route to create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to toggle the reviewed flag of a transaction.
pub const TRANSACTION_REVIEWED: &str = "/api/transactions/{transaction_id}/reviewed";
/// The route to list and record the receipts of a transaction.
pub const TRANSACTION_RECEIPTS: &str = "/api/transactions/{transaction_id}/receipts";
/// The route to delete a receipt.
pub const RECEIPT: &str = "/api/receipts/{receipt_id}";

/// Replace the first parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
/// Call it once per parameter for paths with more than one parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
