//! Request chain subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → context.rs (RequestContext: method, path, query, headers)
//!     → stage.rs (IdentityStage → GuardStage, each returns a Decision)
//!     → composer.rs (run stages, call terminal, log one incoming record)
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Stages are a flat ordered list of trait objects, not nested layers
//! - `Decision` is Continue, Redirect or Error; redirects are not errors
//! - Only the logger has run-on-every-exit semantics

pub mod composer;
pub mod context;
pub mod stage;

pub use composer::{redirect, CurrentPrincipal, RequestChain};
pub use context::{PrincipalAlreadyResolved, RequestContext};
pub use stage::{Decision, GuardStage, IdentityStage, RedirectReason, Stage};
