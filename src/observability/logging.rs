//! Structured outcome logging.
//!
//! # Responsibilities
//! - Define the `OutcomeRecord` emitted for every request and backend call
//! - Provide the logging sink abstraction injected into each component
//! - Initialize the process-wide tracing subscriber
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and environment (`RUST_LOG` wins)
//! - Sinks are append-only; the core never reads them back
//! - The subscriber is installed once by the binary, never by library code

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// What an outcome record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// One per inbound request, emitted when the chain unwinds.
    Incoming,
    /// Emitted before a backend call is dispatched.
    Outgoing,
    /// Emitted after a backend call completes or fails.
    OutgoingResponse,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Incoming => "incoming",
            RecordKind::Outgoing => "outgoing",
            RecordKind::OutgoingResponse => "outgoing_response",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// One structured entry describing a request or outbound call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub level: Level,
    pub method: String,
    /// Path for incoming records, absolute URL for outbound ones.
    pub target: String,
    pub status: Option<u16>,
    pub duration_ms: f64,
    pub message: String,
    pub request_id: Option<String>,
}

impl OutcomeRecord {
    pub fn new(kind: RecordKind, method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            level: Level::Info,
            method: method.into(),
            target: target.into(),
            status: None,
            duration_ms: 0.0,
            message: String::new(),
            request_id: None,
        }
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }

    pub fn duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

/// The logging sink collaborator.
///
/// Must tolerate concurrent writes from many in-flight requests.
pub trait OutcomeSink: Send + Sync + fmt::Debug {
    fn emit(&self, record: &OutcomeRecord);
}

/// Shared handle to the process-scoped sink.
pub type SharedSink = Arc<dyn OutcomeSink>;

/// Writes records as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn emit(&self, r: &OutcomeRecord) {
        let duration = format!("{:.2}", r.duration_ms);
        macro_rules! event {
            ($mac:ident) => {
                tracing::$mac!(
                    kind = r.kind.as_str(),
                    method = %r.method,
                    url = %r.target,
                    status = r.status,
                    duration_ms = %duration,
                    request_id = r.request_id.as_deref(),
                    "{}",
                    r.message
                )
            };
        }
        match r.level {
            Level::Info => event!(info),
            Level::Warn => event!(warn),
            Level::Error => event!(error),
        }
    }
}

/// Collects records in memory; used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<OutcomeRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn records(&self) -> Vec<OutcomeRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        self.records().iter().filter(|r| r.kind == kind).count()
    }

    pub fn count_level(&self, level: Level) -> usize {
        self.records().iter().filter(|r| r.level == level).count()
    }
}

impl OutcomeSink for MemorySink {
    fn emit(&self, record: &OutcomeRecord) {
        match self.records.lock() {
            Ok(mut guard) => guard.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
    }
}

/// Install the global tracing subscriber.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "edge_gateway={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
