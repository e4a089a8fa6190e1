//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::message_body;

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level.
///
/// The `Authorization` header is hidden and JSON bodies have their `password`
/// and `token` fields redacted. Bodies that are not text, such as multipart
/// uploads and images, are passed through unread and only their size is logged.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    hide_credentials(&mut parts.headers);

    let request = if is_text(&parts.headers) {
        let bytes = match to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::error!("Could not read request body: {error}");
                return (
                    StatusCode::BAD_REQUEST,
                    message_body("Could not read request body"),
                )
                    .into_response();
            }
        };

        log_request(&parts, &display_text(&parts.headers, &bytes));
        Request::from_parts(parts, Body::from(bytes))
    } else {
        log_request(&parts, &body_size(&parts.headers));
        Request::from_parts(parts, body)
    };

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();

    if !is_text(&parts.headers) {
        log_response(&parts, &body_size(&parts.headers));
        return Response::from_parts(parts, body);
    }

    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            log_response(&parts, &display_text(&parts.headers, &bytes));
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            (StatusCode::INTERNAL_SERVER_ERROR, message_body("Server Error")).into_response()
        }
    }
}

/// Mark the `Authorization` header as sensitive so that its value is not printed.
fn hide_credentials(headers: &mut HeaderMap) {
    for (name, value) in headers.iter_mut() {
        if *name == AUTHORIZATION {
            value.set_sensitive(true);
        }
    }
}

/// Whether the body described by `headers` is text that is safe to buffer and log.
fn is_text(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        // Requests without bodies, e.g. GET requests, have no content type.
        return true;
    };

    let content_type = content_type.to_ascii_lowercase();

    content_type.starts_with("application/json") || content_type.starts_with("text/")
}

/// A placeholder for a body that is not logged, e.g. "<5242880 bytes>".
fn body_size(headers: &HeaderMap) -> String {
    let size = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    format!("<{size} bytes>")
}

fn display_text(headers: &HeaderMap, bytes: &Bytes) -> String {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("application/json"));

    if is_json {
        redact_secrets(bytes)
    } else {
        String::from_utf8_lossy(bytes).to_string()
    }
}

/// Replace the values of top-level `password` and `token` fields in a JSON object.
fn redact_secrets(json_bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(json_bytes) {
        Ok(Value::Object(mut object)) => {
            for field in ["password", "token"] {
                if let Some(secret) = object.get_mut(field) {
                    *secret = Value::String(REDACTED.to_owned());
                }
            }

            Value::Object(object).to_string()
        }
        _ => String::from_utf8_lossy(json_bytes).to_string(),
    }
}

/// The first [LOG_BODY_LENGTH_LIMIT] bytes of `body`, cut at a character boundary.
fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}
