//! Outbound call interception.
//!
//! # Responsibilities
//! - Dispatch every outbound HTTP call the edge makes
//! - Classify calls as backend-directed with a configurable predicate
//! - Log `outgoing` before dispatch and `outgoing_response` after completion
//! - Bound connection setup, and the wait for response headers once the
//!   request body has been sent
//!
//! # Design Decisions
//! - Classification compares URL origin and host/port markers structurally,
//!   never by substring
//! - Upload time is not part of the upstream deadline: a slow client streaming
//!   a large body is bounded only by the inbound request timeout
//! - The outbound timer is independent of the inbound chain timer
//! - Non-backend calls skip logging entirely
//! - Dropping the returned future or response body closes the upstream
//!   connection instead of draining it

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    http::{Request, Response, Uri},
};
use hyper::body::{Body as HttpBody, Frame, Incoming, SizeHint};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::oneshot;
use url::Url;

use crate::error::EdgeError;
use crate::observability::{metrics, Level, OutcomeRecord, RecordKind, SharedSink};

/// Decides whether an outbound URI targets the backend.
pub trait CallClassifier: Send + Sync + fmt::Debug {
    fn is_backend(&self, uri: &Uri) -> bool;
}

/// Matches the configured backend origin, plus optional host or port markers.
#[derive(Debug, Clone)]
pub struct BackendOrigin {
    scheme: String,
    host: String,
    port: u16,
    markers: Vec<String>,
}

impl BackendOrigin {
    pub fn from_base_url(base_url: &str, markers: Vec<String>) -> Result<Self, url::ParseError> {
        let url = Url::parse(base_url)?;
        let host = url
            .host_str()
            .ok_or(url::ParseError::EmptyHost)?
            .to_ascii_lowercase();
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
            markers: markers.into_iter().map(|m| m.to_ascii_lowercase()).collect(),
        })
    }
}

impl CallClassifier for BackendOrigin {
    fn is_backend(&self, uri: &Uri) -> bool {
        let Some(host) = uri.host().map(str::to_ascii_lowercase) else {
            return false;
        };
        let scheme = uri.scheme_str().unwrap_or("http");
        let port = uri
            .port_u16()
            .unwrap_or(if scheme == "https" { 443 } else { 80 });

        if scheme == self.scheme && host == self.host && port == self.port {
            return true;
        }
        let port = port.to_string();
        self.markers.iter().any(|m| *m == host || *m == port)
    }
}

/// HTTP client wrapped with outcome logging.
#[derive(Debug, Clone)]
pub struct OutboundClient {
    client: Client<HttpConnector, Body>,
    classifier: Arc<dyn CallClassifier>,
    sink: SharedSink,
    timeout: Duration,
}

impl OutboundClient {
    pub fn new(classifier: Arc<dyn CallClassifier>, sink: SharedSink, timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            classifier,
            sink,
            timeout,
        }
    }

    /// Send `request` and return the upstream response with its body unread.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Incoming>, EdgeError> {
        let target = request.uri().to_string();
        let method = request.method().to_string();
        let is_backend = self.classifier.is_backend(request.uri());

        if is_backend {
            self.sink.emit(
                &OutcomeRecord::new(RecordKind::Outgoing, method.clone(), target.clone())
                    .message(format!("Fetching backend: {target}")),
            );
        }

        let start = Instant::now();
        let result = match self.dispatch(request).await {
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(EdgeError::UpstreamUnreachable {
                target: target.clone(),
                source: Box::new(e),
            }),
            None => Err(EdgeError::UpstreamTimeout {
                target: target.clone(),
            }),
        };
        let elapsed = start.elapsed();

        if is_backend {
            let record = OutcomeRecord::new(RecordKind::OutgoingResponse, method.clone(), target)
                .duration_ms(elapsed.as_secs_f64() * 1000.0);
            let record = match &result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    record
                        .status(Some(status))
                        .message(format!("Backend replied: {status}"))
                }
                Err(e) => record
                    .level(Level::Error)
                    .message(format!("Backend call failed: {e}")),
            };
            self.sink.emit(&record);
            metrics::record_backend_call(&method, record.status, elapsed);
        }

        result
    }

    /// Send the request; the deadline starts once the body is fully sent.
    ///
    /// `None` when the upstream missed the deadline.
    async fn dispatch(
        &self,
        request: Request<Body>,
    ) -> Option<Result<Response<Incoming>, hyper_util::client::legacy::Error>> {
        let (parts, body) = request.into_parts();
        let (body, sent) = UploadBody::new(body);
        let response = self.client.request(Request::from_parts(parts, Body::new(body)));
        tokio::pin!(response);

        tokio::select! {
            // The upstream may answer before reading the whole body.
            result = &mut response => Some(result),
            // Sender dropped also counts: the connection is done with the body.
            _ = sent => tokio::time::timeout(self.timeout, response).await.ok(),
        }
    }
}

/// Request body that reports when its last frame has been handed over.
#[derive(Debug)]
struct UploadBody {
    inner: Body,
    sent: Option<oneshot::Sender<()>>,
}

impl UploadBody {
    fn new(inner: Body) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let mut body = Self {
            inner,
            sent: Some(tx),
        };
        // An empty body is never polled.
        if body.inner.is_end_stream() {
            body.finish();
        }
        (body, rx)
    }

    fn finish(&mut self) {
        if let Some(tx) = self.sent.take() {
            let _ = tx.send(());
        }
    }
}

impl HttpBody for UploadBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let poll = Pin::new(&mut self.inner).poll_frame(cx);
        match &poll {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => self.finish(),
            Poll::Ready(Some(Ok(_))) if self.inner.is_end_stream() => self.finish(),
            _ => {}
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;

    fn origin() -> BackendOrigin {
        BackendOrigin::from_base_url("http://backend:8000", vec!["media-store".into()]).unwrap()
    }

    #[test]
    fn classifies_by_origin() {
        let origin = origin();
        assert!(origin.is_backend(&"http://backend:8000/admin/list".parse().unwrap()));
        assert!(origin.is_backend(&"http://BACKEND:8000/".parse().unwrap()));
        assert!(!origin.is_backend(&"http://backend:9000/".parse().unwrap()));
        assert!(!origin.is_backend(&"http://backend-cache:8000/".parse().unwrap()));
        assert!(!origin.is_backend(&"/relative".parse().unwrap()));
    }

    #[test]
    fn markers_extend_classification() {
        let origin = origin();
        assert!(origin.is_backend(&"http://media-store/x".parse().unwrap()));

        let by_port = BackendOrigin::from_base_url("http://backend:8000", vec!["8000".into()]).unwrap();
        assert!(by_port.is_backend(&"http://127.0.0.1:8000/x".parse().unwrap()));
    }

    #[test]
    fn default_port_is_applied() {
        let origin = BackendOrigin::from_base_url("http://backend", Vec::new()).unwrap();
        assert!(origin.is_backend(&"http://backend:80/x".parse().unwrap()));
        assert!(origin.is_backend(&"http://backend/x".parse().unwrap()));
    }

    #[tokio::test]
    async fn unreachable_backend_logs_failure_without_status() {
        // Port 9 on loopback: nothing listens there.
        let origin = BackendOrigin::from_base_url("http://127.0.0.1:9", Vec::new()).unwrap();
        let sink = Arc::new(MemorySink::new());
        let client = OutboundClient::new(Arc::new(origin), sink.clone(), Duration::from_secs(5));

        let request = Request::get("http://127.0.0.1:9/health").body(Body::empty()).unwrap();
        let err = client.send(request).await.unwrap_err();
        assert!(matches!(err, EdgeError::UpstreamUnreachable { .. }));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::Outgoing);
        assert_eq!(records[1].kind, RecordKind::OutgoingResponse);
        assert_eq!(records[1].status, None);
        assert_eq!(records[1].level, Level::Error);
        assert_eq!(records[1].target, "http://127.0.0.1:9/health");
    }

    #[tokio::test]
    async fn non_backend_calls_are_not_logged() {
        let origin = BackendOrigin::from_base_url("http://backend:8000", Vec::new()).unwrap();
        let sink = Arc::new(MemorySink::new());
        let client = OutboundClient::new(Arc::new(origin), sink.clone(), Duration::from_secs(5));

        let request = Request::get("http://127.0.0.1:9/").body(Body::empty()).unwrap();
        assert!(client.send(request).await.is_err());
        assert!(sink.records().is_empty());
    }
}
