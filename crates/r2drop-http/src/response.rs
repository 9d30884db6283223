//! Response serialization and error formatting.

use bytes::Bytes;
use http::{HeaderValue, StatusCode, header};
use serde::Serialize;

use crate::body::DropResponseBody;
use crate::error::ApiError;

/// Content type for JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type for plain-text responses.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Serialize an error into its JSON form.
///
/// ```json
/// { "error": "Missing file name parameter." }
/// ```
#[must_use]
pub fn error_to_json(error: &ApiError) -> String {
    serde_json::json!({ "error": error.message }).to_string()
}

/// Convert an [`ApiError`] into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &ApiError) -> http::Response<DropResponseBody> {
    build_response(error.status, JSON_CONTENT_TYPE, error_to_json(error))
}

/// Serialize `value` into a JSON response with the given status.
#[must_use]
pub fn json_response<T: Serialize>(
    status: StatusCode,
    value: &T,
) -> http::Response<DropResponseBody> {
    match serde_json::to_vec(value) {
        Ok(json) => build_response(status, JSON_CONTENT_TYPE, json),
        Err(e) => error_to_response(&ApiError::internal(format!(
            "Failed to serialize response: {e}"
        ))),
    }
}

/// A plain-text response.
#[must_use]
pub fn text_response(
    status: StatusCode,
    text: impl Into<Bytes>,
) -> http::Response<DropResponseBody> {
    build_response(status, TEXT_CONTENT_TYPE, text)
}

/// A `204 No Content` response.
#[must_use]
pub fn no_content() -> http::Response<DropResponseBody> {
    let mut response = http::Response::new(DropResponseBody::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

fn build_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> http::Response<DropResponseBody> {
    let mut response = http::Response::new(DropResponseBody::from_bytes(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
