//! Category deletion endpoint.

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde_json::Value;

use crate::{
    CategoryId, Error, Identity, message_body,
    category::{CategoryState, delete_category},
};

/// A route handler for deleting one of the logged-in user's categories.
///
/// Categories belonging to other users are reported as not found, and a
/// category cannot be deleted while any transaction refers to it.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(identity): Extension<Identity>,
    category_id: Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<Value>, Error> {
    let Path(category_id) = category_id?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match delete_category(identity.id, category_id, &connection) {
        Ok(()) => Ok(message_body("Category removed")),
        Err(error @ (Error::NotFound | Error::CategoryInUse)) => Err(error),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            Err(error)
        }
    }
}
