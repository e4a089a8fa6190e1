//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and its validated field types
//! - Database functions for storing, querying, and deleting transactions
//! - Route handlers for the transaction API

mod core;
mod create_endpoint;
mod db;
mod delete_endpoint;
mod form;
mod get_endpoint;
mod list_endpoint;

pub use self::core::{
    Amount, CategorySummary, Description, NewTransaction, Transaction, TransactionDetail,
    TransactionListItem, parse_category_id, parse_date,
};
pub use create_endpoint::create_transaction_endpoint;
pub use db::{
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    get_transactions,
};
pub use delete_endpoint::delete_transaction_endpoint;
pub use form::TransactionForm;
pub use get_endpoint::get_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::{AppState, BlobStore};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where receipt images are stored.
    pub blob_store: Arc<dyn BlobStore>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            blob_store: state.blob_store.clone(),
        }
    }
}
