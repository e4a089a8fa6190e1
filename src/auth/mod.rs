//! Registration, log in and the bearer token check for protected routes.

mod log_in;
mod middleware;
mod register;
mod token;

pub use log_in::{LogInForm, log_in_endpoint};
pub use middleware::auth_guard;
pub use register::{RegisterForm, register_endpoint};
pub use token::{Claims, TokenKeys};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{AppState, Identity};

/// The state needed for registering, logging in and checking tokens.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The database connection for looking up and creating users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing and verifying session tokens.
    pub token_keys: TokenKeys,
    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
            password_cost: state.password_cost,
        }
    }
}

/// The response to a successful registration or log in: the user's public
/// details and a session token, e.g. `{"id": 1, "name": "...", "email": "...", "token": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Who logged in.
    #[serde(flatten)]
    pub identity: Identity,
    /// The bearer token for authenticated requests.
    pub token: String,
}
