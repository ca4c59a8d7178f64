//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request chain / outbound client produce:
//!     → logging.rs (OutcomeRecord → OutcomeSink)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → tracing subscriber (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows into every incoming record
//! - The sink is process-scoped state injected at construction
//! - Inbound and outbound timers are independent and reported separately

pub mod logging;
pub mod metrics;

pub use logging::{
    init_tracing, Level, MemorySink, OutcomeRecord, OutcomeSink, RecordKind, SharedSink,
    TracingSink,
};
