//! Registering a new user.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Email, Error, FieldErrors, PasswordHash, UserName, ValidatedPassword,
    auth::{AuthResponse, AuthState},
    user::create_user,
};

/// The request body for registering a user.
///
/// Missing fields deserialize as empty strings so that they are reported as
/// validation errors.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    /// The display name, at least two characters.
    pub name: String,
    /// The email address used to log in.
    pub email: String,
    /// The password, at least six characters.
    pub password: String,
}

/// A route handler for registering a user.
///
/// Responds with 201, the new user's public details and a session token.
/// Every field is validated before responding so that all problems are
/// reported together.
pub async fn register_endpoint(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<impl IntoResponse, Error> {
    let Json(form) = payload?;

    let mut errors = FieldErrors::new();
    let name = errors.record(UserName::new(&form.name))?;
    let email = errors.record(Email::new(&form.email))?;
    let password = errors.record(ValidatedPassword::new(&form.password))?;

    let (Some(name), Some(email), Some(password)) = (name, email, password) else {
        return Err(Error::Validation(errors));
    };

    let password_hash = PasswordHash::new(password, state.password_cost)?;

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        create_user(name, email, password_hash, &connection)?
    };

    tracing::info!("Registered user {}", user.id);

    let token = state.token_keys.encode(user.id, OffsetDateTime::now_utc())?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            identity: user.identity(),
            token,
        }),
    ))
}
