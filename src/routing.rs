//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};

use crate::{
    AppState, Error,
    auth::{auth_guard, get_log_out, get_verify_email, post_log_in, register_user},
    category::{
        create_category_endpoint, delete_category_endpoint, get_categories,
        update_category_endpoint,
    },
    endpoints,
    receipt::{create_receipt_endpoint, delete_receipt_endpoint, get_receipts_endpoint},
    summary::{get_dashboard, get_totals, get_year_to_date},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        toggle_reviewed_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::VERIFY_EMAIL, get(get_verify_email))
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(endpoints::YEAR_TO_DATE, get(get_year_to_date))
        .route(endpoints::TOTALS, get(get_totals))
        .route(
            endpoints::CATEGORIES,
            get(get_categories).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_REVIEWED,
            post(toggle_reviewed_endpoint),
        )
        .route(
            endpoints::TRANSACTION_RECEIPTS,
            get(get_receipts_endpoint).post(create_receipt_endpoint),
        )
        .route(endpoints::RECEIPT, delete(delete_receipt_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
