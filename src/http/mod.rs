//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layer ordering)
//!     → request.rs (request ID stamped and echoed)
//!     → middleware/ (request chain: log, identity, guard)
//!     → session.rs | proxy forwarder | page routes | fallback
//!     → response.rs (relay upstream responses, 404 envelope)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod session;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{build_chain, HttpServer};
pub use session::SessionRoutes;
