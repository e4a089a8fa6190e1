//! Per-user income and expense categories for transactions.

mod create;
mod db;
mod delete;
mod domain;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    create_category, create_category_table, delete_category, get_categories, get_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryForm, CategoryName, CategoryType};
pub use list::list_categories_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
