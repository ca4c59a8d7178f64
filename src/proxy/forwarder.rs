//! Reverse proxy forwarding for the wildcard passthrough.
//!
//! # Responsibilities
//! - Rewrite the inbound URI to the upstream target
//! - Reuse the inbound method and headers unmodified
//! - Stream the request body upstream and the response body back
//! - Map upstream unavailability to the fixed 502 envelope
//!
//! # Design Decisions
//! - No buffering in either direction; bodies are handed over as streams
//! - Upstream non-2xx statuses pass through verbatim
//! - The client disconnecting drops both bodies, closing the upstream exchange

use axum::{
    body::Body,
    extract::State,
    http::{Extensions, Request, StatusCode, Version},
    response::{IntoResponse, Response},
};

use crate::error::json_error;
use crate::http::response::relay;
use crate::proxy::outbound::OutboundClient;
use crate::routing::ProxyRoute;

/// Forwards requests under a prefix to the upstream backend.
#[derive(Debug, Clone)]
pub struct Forwarder {
    route: ProxyRoute,
    client: OutboundClient,
}

impl Forwarder {
    pub fn new(route: ProxyRoute, client: OutboundClient) -> Self {
        Self { route, client }
    }

    pub fn route(&self) -> &ProxyRoute {
        &self.route
    }

    /// Forward one request; always yields a response.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let Some(target) = self.route.target_for_uri(request.uri()) else {
            return json_error(StatusCode::NOT_FOUND, "Not found");
        };
        let uri = match target.to_uri() {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(error = %e, "[Proxy Error] invalid upstream target");
                return e.into_response();
            }
        };

        tracing::info!(
            method = %request.method(),
            path = %request.uri().path(),
            target = %target,
            "[Proxy] forwarding"
        );

        let (mut parts, body) = request.into_parts();
        parts.uri = uri;
        // The upstream connection speaks HTTP/1.1 regardless of the inbound protocol.
        parts.version = Version::HTTP_11;
        parts.extensions = Extensions::new();

        match self.client.send(Request::from_parts(parts, body)).await {
            Ok(upstream) => relay(upstream),
            Err(e) => {
                tracing::error!(target = %target, error = %e, "[Proxy Error]");
                e.into_response()
            }
        }
    }
}

/// Axum handler for every method on the passthrough prefix.
pub async fn proxy_handler(State(forwarder): State<Forwarder>, request: Request<Body>) -> Response {
    forwarder.forward(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::{MemorySink, RecordKind};
    use crate::proxy::outbound::BackendOrigin;
    use std::sync::Arc;
    use std::time::Duration;

    fn forwarder(base: &str, sink: Arc<MemorySink>) -> Forwarder {
        let origin = BackendOrigin::from_base_url(base, Vec::new()).unwrap();
        let client = OutboundClient::new(Arc::new(origin), sink, Duration::from_secs(5));
        Forwarder::new(ProxyRoute::new("/api", base), client)
    }

    #[tokio::test]
    async fn unreachable_upstream_yields_fixed_envelope() {
        let sink = Arc::new(MemorySink::new());
        let request = Request::post("/api/upload")
            .body(Body::from("payload"))
            .unwrap();

        let response = forwarder("http://127.0.0.1:9", sink.clone()).forward(request).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Backend unreachable"}"#);
        assert_eq!(sink.count(RecordKind::Outgoing), 1);
        assert_eq!(sink.count(RecordKind::OutgoingResponse), 1);
    }

    #[tokio::test]
    async fn paths_outside_prefix_are_not_forwarded() {
        let sink = Arc::new(MemorySink::new());
        let request = Request::get("/dashboard").body(Body::empty()).unwrap();

        let response = forwarder("http://127.0.0.1:9", sink.clone()).forward(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(sink.records().is_empty());
    }
}
