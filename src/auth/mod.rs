//! Identity and authorization subsystem.
//!
//! # Data Flow
//! ```text
//! Cookie header
//!     → identity.rs (credential → Principal | none)
//!     → guard.rs (Principal + path → Allow | redirect)
//! ```
//!
//! # Design Decisions
//! - Principal resolved at most once per request, immutable afterward
//! - Policy table loaded once at startup, read-only at request time
//! - Deny decisions are redirects, never error responses

pub mod guard;
pub mod identity;

pub use guard::{Authorization, AuthorizationGuard, PolicyEntry, PolicyTable};
pub use identity::{cookie_value, IdentityResolver, Principal, Role, UnknownRole};
