//! Category listing endpoint.

use axum::{Extension, Json, extract::State};

use crate::{
    Error, Identity,
    category::{Category, CategoryState, get_categories},
};

/// A route handler for listing the logged-in user's categories, newest first.
pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_categories(identity.id, &connection).map(Json)
}
