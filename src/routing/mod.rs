//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path + query
//!     → matcher.rs (segment-aware prefix match, suffix capture)
//!     → target.rs (ProxyTarget = upstream base + suffix + query)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod target;

pub use matcher::PathPrefixMatcher;
pub use target::{ProxyRoute, ProxyTarget};
