//! Database operations for categories.
//!
//! Every query is scoped to the owning user. Another user's category behaves
//! exactly like a category that does not exist.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row, named_params};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::UserID,
    category::{Category, CategoryName},
    database_id::CategoryId,
};

const SELECT_COLUMNS: &str = "SELECT id, user_id, name, created_at, updated_at FROM category";

/// Create a category and return it with its generated ID.
///
/// # Errors
///
/// Returns an [Error::DuplicateCategoryName] if the user already has a
/// category with the same name, ignoring case.
pub fn create_category(
    user_id: UserID,
    name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .execute(
            "INSERT INTO category (user_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3);",
            (user_id.as_i64(), name.as_ref(), now),
        )
        .map_err(|error| map_duplicate_name(error, &name))?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        user_id,
        name,
        created_at: now,
        updated_at: now,
    })
}

/// Retrieve one of the user's categories by ID.
pub fn get_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE id = :id AND user_id = :user_id;"
        ))?
        .query_row(
            &[(":id", &category_id), (":user_id", &user_id.as_i64())],
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve all of the user's categories ordered alphabetically by name.
pub fn get_all_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = :user_id ORDER BY name ASC;"
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Find the user's category called `name`, ignoring case.
pub fn find_category_by_name(
    user_id: UserID,
    name: &str,
    connection: &Connection,
) -> Result<Option<Category>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = :user_id AND name = :name;"
        ))?
        .query_row(
            named_params! { ":user_id": user_id.as_i64(), ":name": name.trim() },
            map_row,
        )
        .optional()
        .map_err(|error| error.into())
}

/// Get the user's categories keyed by their lowercased name.
pub fn get_categories_keyed_by_name(
    user_id: UserID,
    connection: &Connection,
) -> Result<HashMap<String, Category>, Error> {
    Ok(get_all_categories(user_id, connection)?
        .into_iter()
        .map(|category| (category.name.as_ref().to_lowercase(), category))
        .collect())
}

/// Rename one of the user's categories and return the updated category.
///
/// # Errors
///
/// Returns an [Error::UpdateMissingCategory] if the user has no category with
/// `category_id` and an [Error::DuplicateCategoryName] if the new name is
/// already taken.
pub fn update_category(
    user_id: UserID,
    category_id: CategoryId,
    new_name: CategoryName,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
            (
                new_name.as_ref(),
                OffsetDateTime::now_utc(),
                category_id,
                user_id.as_i64(),
            ),
        )
        .map_err(|error| map_duplicate_name(error, &new_name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    get_category(user_id, category_id, connection)
}

/// Delete one of the user's categories. Transactions in the category become
/// uncategorised.
///
/// # Errors
///
/// Returns an [Error::DeleteMissingCategory] if the user has no category with `category_id`.
pub fn delete_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL COLLATE NOCASE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )?;

    Ok(())
}

fn map_duplicate_name(error: rusqlite::Error, name: &CategoryName) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateCategoryName(name.to_string()),
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(2)?;

    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: CategoryName::new_unchecked(&raw_name),
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}
