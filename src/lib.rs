//! Frugal Ledger is a personal finance tracker.
//!
//! Users register, log in, define income and expense categories, and record
//! transactions with an optional receipt image. This library provides the
//! JSON API server and the client that talks to it.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod blob_store;
mod category;
pub mod client;
mod database_id;
mod db;
mod email;
pub mod endpoints;
mod logging;
mod not_found;
mod password;
mod routing;
mod transaction;
mod upload;
mod user;
mod validation;

pub use app_state::AppState;
pub use auth::{AuthResponse, Claims, LogInForm, RegisterForm, TokenKeys};
pub use blob_store::{BlobStore, LocalBlobStore};
pub use category::{Category, CategoryForm, CategoryName, CategoryType};
pub use database_id::{CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use email::Email;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{CategorySummary, Transaction, TransactionDetail, TransactionListItem};
pub use upload::{ALLOWED_IMAGE_EXTENSIONS, IMAGE_FIELD, MAX_IMAGE_SIZE};
pub use user::{Identity, User, UserId, UserName, get_user_by_id};
pub use validation::FieldErrors;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Every variant maps to exactly one HTTP status code and JSON body.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields of the request were missing or malformed.
    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    /// The email and password did not match a registered user.
    ///
    /// The same error is used for an unknown email and a wrong password so
    /// that clients cannot tell whether an email address is registered.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The request did not include a bearer token.
    #[error("no bearer token in the request")]
    MissingToken,

    /// The bearer token could not be decoded, had a bad signature or has expired.
    #[error("the bearer token is invalid")]
    InvalidToken,

    /// The bearer token was valid but its user no longer exists.
    #[error("the token does not belong to a registered user")]
    UnknownUser,

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported with this error too, so
    /// that callers cannot learn whether another user's data exists.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The email address used for registration already belongs to a user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// The user already has a category with this name.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// The category cannot be deleted while transactions refer to it.
    #[error("the category is used by at least one transaction")]
    CategoryInUse,

    /// The category ID used to create a transaction does not refer to one of
    /// the caller's categories.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// A blob with the requested name already exists in the blob store.
    #[error("the blob \"{0}\" already exists")]
    BlobExists(String),

    /// The blob store could not read or write a blob.
    #[error("blob storage failed: {0}")]
    BlobStorage(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("user.email") => Error::DuplicateEmail,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(FieldErrors::single("body", rejection.body_text()))
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Could not parse path parameters: {}", rejection.body_text());
        Error::NotFound
    }
}

/// Build the JSON body `{"message": message}`.
pub(crate) fn message_body(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": message }))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            Error::InvalidCategory(_) => {
                let errors = FieldErrors::single(
                    "categoryId",
                    "The category is not valid or does not belong to you",
                );
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                message_body("Invalid email or password"),
            )
                .into_response(),
            Error::MissingToken => (
                StatusCode::UNAUTHORIZED,
                message_body("Not authorized, no token"),
            )
                .into_response(),
            Error::InvalidToken | Error::UnknownUser => (
                StatusCode::UNAUTHORIZED,
                message_body("Not authorized, token failed"),
            )
                .into_response(),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                message_body("The requested resource could not be found"),
            )
                .into_response(),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                message_body("The email address is already registered"),
            )
                .into_response(),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                message_body(&format!("Category '{name}' already exists")),
            )
                .into_response(),
            Error::CategoryInUse => (
                StatusCode::BAD_REQUEST,
                message_body("Cannot delete a category that has transactions"),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (StatusCode::INTERNAL_SERVER_ERROR, message_body("Server Error")).into_response()
            }
        }
    }
}
