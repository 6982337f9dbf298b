//! Categories group a user's transactions, e.g. 'Groceries' or 'Wages'.

mod db;
mod domain;
mod endpoints;

pub use db::{
    create_category, create_category_table, delete_category, find_category_by_name,
    get_all_categories, get_categories_keyed_by_name, get_category, update_category,
};
pub use domain::{Category, CategoryData, CategoryName};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, get_categories, update_category_endpoint,
};
