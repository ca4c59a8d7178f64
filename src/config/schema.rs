//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream backend reached by the proxy and outbound calls.
    pub backend: BackendConfig,

    /// Wildcard passthrough settings.
    pub proxy: ProxyRouteConfig,

    /// Policy table: path prefix to minimum role.
    pub policies: Vec<PolicyConfig>,

    /// Session cookie and login collaborator settings.
    pub session: SessionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend (scheme, host, optional port and path).
    pub base_url: String,

    /// Extra host or port markers that classify an outbound URL as a backend call.
    pub markers: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://backend:8000".to_string(),
            markers: Vec::new(),
        }
    }
}

/// Wildcard passthrough configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyRouteConfig {
    /// Path prefix whose remainder is forwarded verbatim (e.g., "/api").
    pub prefix: String,
}

impl Default for ProxyRouteConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// One entry of the policy table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Protected path prefix.
    pub path_prefix: String,

    /// Minimum role needed to pass.
    pub required_role: Role,
}

/// Session cookie and login collaborator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Credential values that resolve to the editor role.
    pub editor_credentials: Vec<String>,

    /// Credential issued by the reader dev login.
    pub reader_credential: String,

    /// Login entry point; receives `returnTo`.
    pub login_path: String,

    /// Landing page for unauthorized principals.
    pub home_path: String,

    /// Where the login entry point sends users when `returnTo` is absent.
    pub default_return_to: String,

    /// Mount the `/dev/login/*` actions.
    pub dev_login: bool,

    /// Session cookie lifetime in seconds.
    pub max_age_secs: u64,

    /// Mark the cookie `Secure`.
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_id".to_string(),
            // WARNING: placeholder credential, not a verified token.
            editor_credentials: vec!["editor-secret".to_string()],
            reader_credential: "reader-token".to_string(),
            login_path: "/edit".to_string(),
            home_path: "/".to_string(),
            default_return_to: "/dashboard".to_string(),
            dev_login: false,
            max_age_secs: 60 * 60 * 24,
            secure_cookie: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for the upstream to answer with response headers, in seconds.
    pub upstream_secs: u64,

    /// Inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            request_secs: 300,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backend: BackendConfig::default(),
            proxy: ProxyRouteConfig::default(),
            policies: default_policies(),
            session: SessionConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Editor area protected out of the box.
pub fn default_policies() -> Vec<PolicyConfig> {
    vec![
        PolicyConfig {
            path_prefix: "/dashboard".to_string(),
            required_role: Role::Editor,
        },
        PolicyConfig {
            path_prefix: "/jobs".to_string(),
            required_role: Role::Editor,
        },
    ]
}
