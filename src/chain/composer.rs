//! Request chain composition.
//!
//! # Stage Order
//! ```text
//! Logger-start → Identity → Guard → terminal handler → Logger-end
//! ```
//!
//! # Design Decisions
//! - Stages run in a fixed order; the first terminal decision wins
//! - Logger-end runs on every exit path, including a dropped future
//!   (client disconnect), so exactly one incoming record is emitted
//! - Timing covers every stage, measured from chain entry to chain exit
//! - Panics in stages become a generic 500; terminal failures are logged
//!   and returned to the caller unchanged

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;

use crate::auth::Principal;
use crate::chain::context::RequestContext;
use crate::chain::stage::{Decision, RedirectReason, Stage};
use crate::error::{json_error, EdgeError};
use crate::observability::{metrics, Level, OutcomeRecord, RecordKind, SharedSink};

/// Principal attached to the request for terminal handlers.
///
/// `None` inside means the chain ran and found no credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPrincipal(pub Option<Principal>);

/// Ordered list of stages plus the sink that observes every outcome.
#[derive(Debug, Clone)]
pub struct RequestChain {
    stages: Vec<Arc<dyn Stage>>,
    sink: SharedSink,
}

impl RequestChain {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            stages: Vec::new(),
            sink,
        }
    }

    /// Append a stage; stages run in insertion order.
    pub fn with_stage<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage, then `terminal`, and log the final outcome.
    pub async fn handle<F, Fut>(&self, mut request: Request<Body>, terminal: F) -> Result<Response, EdgeError>
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Result<Response, EdgeError>>,
    {
        let mut ctx = RequestContext::from_request(&request);
        let log = IncomingLog::start(&self.sink, &ctx);

        for stage in &self.stages {
            let decision = match AssertUnwindSafe(stage.run(&mut ctx)).catch_unwind().await {
                Ok(decision) => decision,
                Err(panic) => {
                    let detail = panic_message(panic.as_ref());
                    tracing::error!(
                        stage = stage.name(),
                        method = %ctx.method(),
                        path = %ctx.path(),
                        error = %detail,
                        "Chain stage panicked"
                    );
                    let err = EdgeError::Internal(format!("stage {} panicked: {detail}", stage.name()));
                    log.finish(Some(err.status()), Level::Error, format!("{} {}", ctx.method(), err));
                    return Ok(err.into_response());
                }
            };

            match decision {
                Decision::Continue => continue,
                Decision::Redirect { location, reason } => {
                    let response = redirect(&location);
                    let level = match reason {
                        RedirectReason::Unauthorized => Level::Warn,
                        RedirectReason::Unauthenticated => Level::Info,
                    };
                    let message = format!(
                        "{} {} -> {} ({})",
                        ctx.method(),
                        ctx.return_to(),
                        location,
                        reason.as_str()
                    );
                    log.finish(Some(response.status()), level, message);
                    return Ok(response);
                }
                Decision::Error { status, message } => {
                    let level = if status.is_server_error() { Level::Error } else { Level::Warn };
                    log.finish(
                        Some(status),
                        level,
                        format!("{} {} rejected by {}", ctx.method(), ctx.return_to(), stage.name()),
                    );
                    return Ok(json_error(status, &message));
                }
            }
        }

        request
            .extensions_mut()
            .insert(CurrentPrincipal(ctx.principal().cloned()));

        let outcome = AssertUnwindSafe(async move { terminal(request).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(EdgeError::Internal(format!(
                    "handler panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });

        let summary = format!("{} {}", ctx.method(), ctx.return_to());
        match &outcome {
            Ok(response) => {
                let status = response.status();
                let level = if status.is_server_error() { Level::Error } else { Level::Info };
                log.finish(Some(status), level, summary);
            }
            Err(err) => {
                tracing::error!(method = %ctx.method(), path = %ctx.path(), error = %err, "Request failed");
                log.finish(Some(err.status()), Level::Error, format!("{summary}: {err}"));
            }
        }
        outcome
    }
}

/// `303 See Other` to `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = StatusCode::SEE_OTHER.into_response();
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => EdgeError::Internal(format!("unencodable redirect location {location:?}")).into_response(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Emits the single incoming record for a request.
///
/// If the chain future is dropped before `finish` (client went away), the
/// record is emitted from `Drop` with no status.
struct IncomingLog<'a> {
    sink: &'a SharedSink,
    method: String,
    target: String,
    request_id: Option<String>,
    start: Instant,
    done: bool,
}

impl<'a> IncomingLog<'a> {
    fn start(sink: &'a SharedSink, ctx: &RequestContext) -> Self {
        Self {
            sink,
            method: ctx.method().to_string(),
            target: ctx.return_to(),
            request_id: ctx.request_id().map(str::to_string),
            start: Instant::now(),
            done: false,
        }
    }

    fn finish(mut self, status: Option<StatusCode>, level: Level, message: String) {
        self.emit(status.map(|s| s.as_u16()), level, message);
    }

    fn emit(&mut self, status: Option<u16>, level: Level, message: String) {
        self.done = true;
        let elapsed = self.start.elapsed();
        let record = OutcomeRecord::new(RecordKind::Incoming, self.method.clone(), self.target.clone())
            .level(level)
            .status(status)
            .duration_ms(elapsed.as_secs_f64() * 1000.0)
            .message(message)
            .request_id(self.request_id.clone());
        self.sink.emit(&record);
        metrics::record_request(&self.method, status, elapsed);
    }
}

impl Drop for IncomingLog<'_> {
    fn drop(&mut self) {
        if !self.done {
            let message = format!("{} {} cancelled before completion", self.method, self.target);
            self.emit(None, Level::Warn, message);
        }
    }
}
