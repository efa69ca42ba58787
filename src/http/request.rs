//! Request identification.
//!
//! Every request carries an `x-request-id`: the client's if it sent one,
//! otherwise a UUID v4 assigned by `SetRequestIdLayer` in the server stack.

use axum::http::{HeaderMap, HeaderName};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID from the headers, `"unknown"` when absent.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
