//! The client side of Frugal Ledger: an HTTP client for the API, the cached
//! session, the view state machine and the derived dashboard summary.

mod api;
mod app;
mod render;
mod session;
mod summary;

pub use api::{ApiClient, NewTransactionRequest, ReceiptImage};
pub use app::{ClientApp, Dashboard, View};
pub use render::{format_currency, render_dashboard, render_transaction};
pub use session::{DEFAULT_SESSION_LIFETIME, Session, SessionStore};
pub use summary::{
    ChartSlice, EXPENSE_COLOUR, INCOME_COLOUR, SliceLabel, Summary, summarize,
};

use reqwest::StatusCode;

use crate::FieldErrors;

/// The errors the client may encounter when talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server rejected one or more fields of the request.
    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    /// The credentials or the session token were rejected.
    ///
    /// The cached session is evicted when this error is returned.
    #[error("{0}")]
    Unauthorized(String),

    /// The requested resource does not exist or belongs to someone else.
    #[error("{0}")]
    NotFound(String),

    /// The server refused the request, e.g. a duplicate category name.
    #[error("{0}")]
    Rejected(String),

    /// The server failed to handle the request.
    #[error("the server responded with {status}: {message}")]
    Server {
        /// The HTTP status code of the response.
        status: StatusCode,
        /// The message from the response body.
        message: String,
    },

    /// The request could not be sent or the response could not be received.
    #[error("could not reach the server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not in the expected format.
    #[error("could not read the server's response: {0}")]
    Decode(String),

    /// The action requires a logged in user but there is no current session.
    #[error("you are not logged in")]
    NoSession,

    /// The session file could not be read or written.
    #[error("could not access the session file: {0}")]
    SessionFile(String),
}

impl ClientError {
    /// Whether this error means the session is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_) | ClientError::NoSession)
    }
}
