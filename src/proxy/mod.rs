//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Request under the passthrough prefix
//!     → forwarder.rs (ProxyTarget, URI rewrite, header pass-through)
//!     → outbound.rs (classify, log outgoing, dispatch with deadline)
//!     → upstream backend
//!     → outbound.rs (log outgoing_response)
//!     → forwarder.rs (relay status, headers, body stream)
//! ```
//!
//! # Design Decisions
//! - The only synthesized body is the 502 envelope; everything else is
//!   upstream bytes
//! - Timeouts and transport failures are both "unreachable" to clients

pub mod forwarder;
pub mod outbound;

pub use forwarder::{proxy_handler, Forwarder};
pub use outbound::{BackendOrigin, CallClassifier, OutboundClient};
