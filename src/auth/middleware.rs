//! Authentication middleware that resolves bearer tokens to the caller's identity.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{Error, Identity, auth::AuthState, get_user_by_id};

/// Middleware function that checks for a valid bearer token.
///
/// The caller's [Identity] is placed into the request and then the request
/// executed normally if the token is valid, otherwise a 401 response is
/// returned.
///
/// **Note**: Route handlers can use the function argument `Extension(identity): Extension<Identity>` to receive the identity.
pub async fn auth_guard(
    State(state): State<AuthState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, bearer) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

fn authenticate(
    state: &AuthState,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<Identity, Error> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|rejection| {
        if rejection.is_missing() {
            Error::MissingToken
        } else {
            tracing::debug!("Malformed authorization header: {rejection}");
            Error::InvalidToken
        }
    })?;

    let claims = state.token_keys.decode(bearer.token())?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match get_user_by_id(claims.sub, &connection) {
        Ok(user) => Ok(user.identity()),
        Err(Error::NotFound) => {
            tracing::debug!("Token for user {} who no longer exists", claims.sub);
            Err(Error::UnknownUser)
        }
        Err(error) => Err(error),
    }
}
