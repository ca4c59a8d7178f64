//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): inbound requests by method, status
//! - `edge_request_duration_seconds` (histogram): chain latency
//! - `edge_backend_calls_total` (counter): backend calls by method, outcome
//! - `edge_backend_call_duration_seconds` (histogram): backend call latency
//! - `edge_auth_redirects_total` (counter): guard redirects by reason
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Without an installed recorder every call is a no-op
//! - Prometheus exporter only when enabled in config

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(method: &str, status: Option<u16>, elapsed: Duration) {
    let status = status.map_or_else(|| "none".to_string(), |s| s.to_string());
    counter!("edge_requests_total", "method" => method.to_string(), "status" => status).increment(1);
    histogram!("edge_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a completed (or failed) backend call.
pub fn record_backend_call(method: &str, status: Option<u16>, elapsed: Duration) {
    let outcome = status.map_or_else(|| "failed".to_string(), |s| s.to_string());
    counter!("edge_backend_calls_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("edge_backend_call_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a guard redirect; `reason` is `unauthenticated` or `unauthorized`.
pub fn record_auth_redirect(reason: &'static str) {
    counter!("edge_auth_redirects_total", "reason" => reason).increment(1);
}
