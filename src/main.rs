//! Edge Gateway
//!
//! Request-processing edge for a web application, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ request chain ─────────────────┐
//!                                   │ logger (one incoming record) │
//!                                   │ identity (cookie → principal)│
//!                                   │ guard (prefix policies)      │
//!                                   └──────────────┬───────────────┘
//!                                                  │
//!                  ┌───────────────────┬───────────┴──────────┐
//!                  ▼                   ▼                      ▼
//!           session routes      /api/* forwarder         fallback 404
//!                                      │
//!                                      ▼
//!                              outbound client ─────────▶ Backend
//!                        (outgoing / outgoing_response)
//! ```

use edge_gateway::config::load_from_env;
use edge_gateway::lifecycle;
use edge_gateway::observability::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_from_env()?;
    init_tracing(&config.observability);

    tracing::info!("edge-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
