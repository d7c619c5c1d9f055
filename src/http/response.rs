//! HTTP response building module
//!
//! Builders for the fixed dispatcher responses and for the common body types
//! handlers return.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::StatusCode;
use serde::Serialize;

/// Response type produced by handlers and by the dispatcher
pub type Response = hyper::Response<Full<Bytes>>;

/// Body of the response sent when a middleware halts the pipeline
pub const BLOCKED_BODY: &str = "Request Blocked";
/// Body of the response sent when nothing matched the request
pub const NOT_FOUND_BODY: &str = "Not Found";
/// Body of the response sent when a static file cannot be read
pub const FILE_NOT_FOUND_BODY: &str = "File Not Found";

const INTERNAL_ERROR_BODY: &str = "Internal Server Error";
const PAYLOAD_TOO_LARGE_BODY: &str = "Payload Too Large";

/// Build 403 response for a request halted by middleware
pub fn build_blocked_response() -> Response {
    build_text_response(StatusCode::FORBIDDEN, BLOCKED_BODY)
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response {
    build_text_response(StatusCode::NOT_FOUND, NOT_FOUND_BODY)
}

/// Build 404 response for an unreadable static file
pub fn build_file_not_found_response() -> Response {
    build_text_response(StatusCode::NOT_FOUND, FILE_NOT_FOUND_BODY)
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response {
    build_text_response(StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE_BODY)
}

/// Build 500 response for a failed handler or middleware
pub fn build_500_response() -> Response {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY)
}

/// Build plain-text response
pub fn build_text_response(status: StatusCode, body: impl Into<String>) -> Response {
    build_response(status, "text/plain; charset=utf-8", Bytes::from(body.into()))
}

/// Build HTML response
pub fn build_html_response(status: StatusCode, body: impl Into<String>) -> Response {
    build_response(status, "text/html; charset=utf-8", Bytes::from(body.into()))
}

/// Build JSON response from any serializable value
pub fn build_json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => build_response(status, "application/json", Bytes::from(body)),
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize JSON response: {e}"));
            build_500_response()
        }
    }
}

/// Build 200 response carrying raw file bytes
pub fn build_file_response(data: Vec<u8>, content_type: &str) -> Response {
    build_response(StatusCode::OK, content_type, Bytes::from(data))
}

fn build_response(status: StatusCode, content_type: &str, body: Bytes) -> Response {
    let content_length = body.len();
    hyper::Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            let mut fallback = hyper::Response::new(Full::new(body));
            *fallback.status_mut() = status;
            fallback
        })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
