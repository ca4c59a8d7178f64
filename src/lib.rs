//! Edge Gateway Library
//!
//! Request chain (logging, identity, authorization) in front of page routes,
//! plus a wildcard passthrough proxy to the backend API.

pub mod auth;
pub mod chain;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::EdgeConfig;
pub use error::EdgeError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
