//! Error taxonomy for the edge.
//!
//! Redirects and upstream statuses are ordinary control flow and never pass
//! through here. These variants cover transport failures and programming
//! errors; each renders a small fixed JSON envelope and never leaks detail.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Body sent when the upstream cannot be reached.
pub const BACKEND_UNREACHABLE: &str = "Backend unreachable";

/// Body sent for unexpected internal failures.
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum EdgeError {
    /// Connect, DNS or transport failure while talking to the upstream.
    #[error("upstream {target} unreachable: {source}")]
    UpstreamUnreachable {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Upstream did not answer within the configured deadline.
    #[error("upstream {target} timed out")]
    UpstreamTimeout { target: String },

    /// The computed upstream URL is not a valid URI.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    /// Unexpected failure inside a chain stage or handler.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EdgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::UpstreamUnreachable { .. }
            | EdgeError::UpstreamTimeout { .. }
            | EdgeError::InvalidTarget(_) => StatusCode::BAD_GATEWAY,
            EdgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; fixed per class.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_GATEWAY => BACKEND_UNREACHABLE,
            _ => INTERNAL_ERROR,
        }
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.public_message())
    }
}

/// `{"error": message}` with a JSON content type.
pub fn json_error(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
