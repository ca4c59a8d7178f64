//! Axum middleware adapters.

pub mod request_chain;

pub use request_chain::request_chain_middleware;
