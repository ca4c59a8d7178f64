//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional, named by EDGE_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is read once at process start; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, load_from_env, ConfigError};
pub use schema::{
    BackendConfig, EdgeConfig, ListenerConfig, LogFormat, ObservabilityConfig, PolicyConfig,
    ProxyRouteConfig, SessionConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
