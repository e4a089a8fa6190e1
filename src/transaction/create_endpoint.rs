//! Defines the endpoint for creating a new transaction.

use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use time::OffsetDateTime;

use crate::{
    Error, FieldErrors, Identity,
    transaction::{TransactionForm, TransactionState, create_transaction},
    upload::{multipart_rejection, store_image},
};

/// A route handler for creating a transaction from a multipart form with the
/// fields amount, description, categoryId, an optional date and an optional
/// image.
///
/// Every field is validated before anything is stored. The image is stored
/// before the row is inserted and is removed again if the insert fails.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(identity): Extension<Identity>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, Error> {
    let mut multipart = multipart.map_err(multipart_rejection)?;
    let mut errors = FieldErrors::new();

    let form = TransactionForm::read(&mut multipart, &mut errors).await?;
    let Some(mut new_transaction) = form.validate(OffsetDateTime::now_utc(), &mut errors)? else {
        return Err(Error::Validation(errors));
    };

    if let Some(image) = &form.image {
        new_transaction.image_url = Some(store_image(state.blob_store.as_ref(), image)?);
    }

    let result = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        });

        connection.and_then(|connection| {
            create_transaction(identity.id, new_transaction.clone(), &connection)
        })
    };

    match result {
        Ok(transaction) => Ok((StatusCode::CREATED, Json(transaction))),
        Err(error) => {
            if let Some(image_url) = &new_transaction.image_url
                && let Err(remove_error) = state.blob_store.remove(image_url)
            {
                tracing::error!(
                    "could not remove image {image_url} after failed insert: {remove_error}"
                );
            }

            Err(error)
        }
    }
}
