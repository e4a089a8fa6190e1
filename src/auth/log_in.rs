//! Logging in with an email address and password.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Email, Error, FieldErrors,
    auth::{AuthResponse, AuthState},
    user::get_user_by_email,
};

/// The request body for logging in.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogInForm {
    /// The email address the user registered with.
    pub email: String,
    /// The user's password.
    pub password: String,
}

/// A route handler for logging in.
///
/// Responds with the user's public details and a session token. An unknown
/// email and a wrong password produce the same error.
pub async fn log_in_endpoint(
    State(state): State<AuthState>,
    payload: Result<Json<LogInForm>, JsonRejection>,
) -> Result<Json<AuthResponse>, Error> {
    let Json(form) = payload?;

    let mut errors = FieldErrors::new();
    let email = errors.record(Email::new(&form.email))?;
    if form.password.is_empty() {
        errors.add("password", "Password is required");
    }

    let Some(email) = email.filter(|_| errors.is_empty()) else {
        return Err(Error::Validation(errors));
    };

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::debug!("Log in attempt for unregistered email");
                return Err(Error::InvalidCredentials);
            }
            Err(error) => return Err(error),
        }
    };

    if !user.password_hash.verify(&form.password)? {
        tracing::debug!("Wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let token = state.token_keys.encode(user.id, OffsetDateTime::now_utc())?;

    Ok(Json(AuthResponse {
        identity: user.identity(),
        token,
    }))
}
