//! Defines the endpoint for deleting a transaction.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde_json::Value;

use crate::{
    Error, Identity, TransactionId, message_body,
    transaction::{TransactionState, delete_transaction},
};

/// A route handler for deleting one of the logged-in user's transactions.
///
/// The receipt image, if any, stays where it is.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(identity): Extension<Identity>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<Value>, Error> {
    let Path(transaction_id) = transaction_id?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match delete_transaction(identity.id, transaction_id, &connection) {
        Ok(()) => Ok(message_body("Transaction removed")),
        Err(Error::NotFound) => Err(Error::NotFound),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            Err(error)
        }
    }
}
