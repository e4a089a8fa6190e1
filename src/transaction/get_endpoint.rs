//! Defines the endpoint for getting a single transaction.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};

use crate::{
    Error, Identity, TransactionId,
    transaction::{TransactionDetail, TransactionState, get_transaction},
};

/// A route handler for getting one of the logged-in user's transactions with
/// its full category.
///
/// This function will return the status code 404 if the requested resource
/// does not exist or belongs to another user.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(identity): Extension<Identity>,
    transaction_id: Result<Path<TransactionId>, PathRejection>,
) -> Result<Json<TransactionDetail>, Error> {
    let Path(transaction_id) = transaction_id?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transaction(identity.id, transaction_id, &connection).map(Json)
}
