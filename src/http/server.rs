//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, request chain, timeout)
//! - Mount the passthrough proxy and session collaborators
//! - Bind server to listener with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{AuthorizationGuard, IdentityResolver, PolicyTable};
use crate::chain::{GuardStage, IdentityStage, RequestChain};
use crate::config::{validate_config, ConfigError, EdgeConfig, ValidationError};
use crate::http::middleware::request_chain_middleware;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::not_found;
use crate::http::session::SessionRoutes;
use crate::observability::{SharedSink, TracingSink};
use crate::proxy::{proxy_handler, BackendOrigin, Forwarder, OutboundClient};
use crate::routing::ProxyRoute;

/// HTTP server for the edge.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
}

impl HttpServer {
    /// Create a server logging through `tracing`.
    pub fn new(config: EdgeConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, Arc::new(TracingSink), Router::new())
    }

    /// Create a server with an explicit sink and extra page routes.
    ///
    /// `pages` run behind the request chain like every other route.
    pub fn with_parts(config: EdgeConfig, sink: SharedSink, pages: Router) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let origin = BackendOrigin::from_base_url(&config.backend.base_url, config.backend.markers.clone())
            .map_err(|_| {
                ConfigError::Validation(vec![ValidationError::BackendUrl(config.backend.base_url.clone())])
            })?;
        let client = OutboundClient::new(
            Arc::new(origin),
            sink.clone(),
            Duration::from_secs(config.timeouts.upstream_secs),
        );
        let forwarder = Forwarder::new(
            ProxyRoute::new(&config.proxy.prefix, &config.backend.base_url),
            client,
        );
        let chain = Arc::new(build_chain(&config, sink));
        tracing::debug!(stages = ?chain.stage_names(), "Request chain assembled");

        let router = Self::build_router(&config, forwarder, chain, pages);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, forwarder: Forwarder, chain: Arc<RequestChain>, pages: Router) -> Router {
        let prefix = forwarder.route().prefix().to_string();
        let proxy: MethodRouter<Forwarder> = get(proxy_handler)
            .post(proxy_handler)
            .put(proxy_handler)
            .delete(proxy_handler)
            .patch(proxy_handler);

        // Validation guarantees a non-root prefix free of route syntax.
        let proxy_routes = Router::new()
            .route(&prefix, proxy.clone())
            .route(&format!("{prefix}/"), proxy.clone())
            .route(&format!("{prefix}/{{*path}}"), proxy)
            .with_state(forwarder);

        Router::new()
            .merge(proxy_routes)
            .merge(SessionRoutes::new(config.session.clone()).router())
            .merge(pages)
            .fallback(not_found)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(chain, request_chain_middleware))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.backend.base_url,
            proxy_prefix = %self.config.proxy.prefix,
            policies = self.config.policies.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

/// Logger, identity and guard stages in their fixed order.
pub fn build_chain(config: &EdgeConfig, sink: SharedSink) -> RequestChain {
    let resolver = IdentityResolver::new(
        config.session.cookie_name.clone(),
        config.session.editor_credentials.clone(),
    );
    let guard = AuthorizationGuard::new(
        PolicyTable::from_config(&config.policies),
        config.session.login_path.clone(),
        config.session.home_path.clone(),
    );
    RequestChain::new(sink)
        .with_stage(IdentityStage::new(resolver))
        .with_stage(GuardStage::new(guard))
}
