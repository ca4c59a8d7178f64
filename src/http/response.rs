//! Response helpers.
//!
//! # Responsibilities
//! - Relay upstream responses to the client
//! - Render the edge's own fallback responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Status and headers from upstream are kept verbatim

use axum::{
    body::Body,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
};
use hyper::body::Incoming;

use crate::error::json_error;

/// Hand an upstream response to the client without touching its body.
pub fn relay(upstream: HttpResponse<Incoming>) -> Response {
    let (parts, body) = upstream.into_parts();
    Response::from_parts(parts, Body::new(body))
}

/// Fallback for paths nothing handles.
pub async fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "Not found")
}
