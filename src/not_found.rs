//! The response for routes that do not exist.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::message_body;

/// Respond with 404 and a JSON message naming the missing route.
pub async fn get_404_not_found(uri: axum::http::Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        message_body(&format!("Not Found - {uri}")),
    )
        .into_response()
}
