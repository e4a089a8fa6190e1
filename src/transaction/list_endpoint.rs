//! Defines the endpoint for listing transactions.

use axum::{Extension, Json, extract::State};

use crate::{
    Error, Identity,
    transaction::{TransactionListItem, TransactionState, get_transactions},
};

/// A route handler for listing the logged-in user's transactions, most
/// recent date first, each with its category's name and type.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<TransactionListItem>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_transactions(identity.id, &connection).map(Json)
}
