//! The JSON endpoints for listing, creating, renaming and deleting categories.
//!
//! Every successful write drops the user's cached category ranking.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{
        Category, CategoryData, CategoryName, create_category, delete_category,
        get_all_categories, update_category,
    },
    database_id::CategoryId,
    summary::SummaryService,
};

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Invalidates cached metrics after a write.
    pub summary: SummaryService,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            summary: state.summary.clone(),
        }
    }
}

/// List the logged in user's categories in alphabetical order.
pub async fn get_categories(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_all_categories(user_id, &connection).map(Json)
}

/// Create a category for the logged in user.
///
/// # Errors
///
/// Returns [Error::EmptyCategoryName] for a blank name and
/// [Error::DuplicateCategoryName] if the user already has the name.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<CategoryData>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&data.name)?;

    let category = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        create_category(user_id, name, &connection)?
    };

    state.summary.invalidate_categories(user_id);

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

/// Rename one of the logged in user's categories.
///
/// # Errors
///
/// Returns [Error::UpdateMissingCategory] if the category does not exist or
/// belongs to another user.
pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
    Json(data): Json<CategoryData>,
) -> Result<Json<Category>, Error> {
    let name = CategoryName::new(&data.name)?;

    let category = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        update_category(user_id, category_id, name, &connection)?
    };

    state.summary.invalidate_categories(user_id);

    Ok(Json(category))
}

/// Delete one of the logged in user's categories.
///
/// The category's transactions are kept and become uncategorised.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        delete_category(user_id, category_id, &connection)?;
    }

    state.summary.invalidate_categories(user_id);

    Ok(StatusCode::NO_CONTENT)
}
