//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use edge_gateway::config::EdgeConfig;
use edge_gateway::http::HttpServer;
use edge_gateway::lifecycle::Shutdown;
use edge_gateway::observability::MemorySink;
use tokio::net::TcpListener;

/// What a mock backend saw for one request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

pub type Seen = Arc<Mutex<Vec<SeenRequest>>>;

/// Start a programmable mock backend on an ephemeral port.
///
/// `respond` picks the status and body for each request; every response
/// also carries `x-backend: mock` so pass-through can be asserted.
pub async fn start_programmable_backend<F>(respond: F) -> (SocketAddr, Seen)
where
    F: Fn(&SeenRequest) -> (u16, String) + Send + Sync + 'static,
{
    let seen: Seen = Arc::default();
    let respond = Arc::new(respond);

    let state = seen.clone();
    let app = Router::new().fallback(move |request: Request<Body>| {
        let seen = state.clone();
        let respond = respond.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX)
                .await
                .map(|b| b.to_vec())
                .unwrap_or_default();
            let record = SeenRequest {
                method: parts.method.to_string(),
                path_and_query: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.to_string())
                    .unwrap_or_default(),
                headers: parts.headers,
                body,
            };
            let (status, body) = respond(&record);
            seen.lock().unwrap().push(record);

            let status = StatusCode::from_u16(status).unwrap();
            (status, [("x-backend", "mock")], body).into_response()
        }
    });

    (serve(app).await, seen)
}

/// Serve `app` on an ephemeral loopback port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A running edge instance.
pub struct Edge {
    pub addr: SocketAddr,
    pub sink: Arc<MemorySink>,
    pub shutdown: Shutdown,
}

impl Edge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Edge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Default configuration pointed at `backend`.
pub fn config_for(backend: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.backend.base_url = format!("http://{backend}");
    config
}

/// Start the edge with a memory sink and the standard page routes.
pub async fn start_edge(config: EdgeConfig) -> Edge {
    let sink = Arc::new(MemorySink::new());
    let server = HttpServer::with_parts(config, sink.clone(), pages()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    Edge {
        addr,
        sink,
        shutdown,
    }
}

/// Stand-ins for the application's page handlers.
pub fn pages() -> Router {
    async fn page(request: Request<Body>) -> Response {
        format!("page {}", request.uri().path()).into_response()
    }

    Router::new()
        .route("/", axum::routing::get(page))
        .route("/about", axum::routing::get(page))
        .route("/dashboard", axum::routing::get(page))
        .route("/jobs/{id}", axum::routing::get(page))
}

/// Client that never follows redirects or consults system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
