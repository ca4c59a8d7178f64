//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::auth::Role;
use crate::config::schema::{EdgeConfig, LogFormat, PolicyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EdgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: EdgeConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the process configuration: optional file named by `EDGE_CONFIG`,
/// then environment overrides, then validation.
pub fn load_from_env() -> Result<EdgeConfig, ConfigError> {
    let mut config = match std::env::var("EDGE_CONFIG") {
        Ok(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        Err(_) => EdgeConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-style keys on `config`.
///
/// `lookup` abstracts the environment so tests never touch process state.
pub fn apply_env_overrides<F>(config: &mut EdgeConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // EDGE_BACKEND_URL wins over the frontend-era name.
    if let Some(url) = lookup("EDGE_BACKEND_URL").or_else(|| lookup("PUBLIC_BACKEND_SERVER")) {
        config.backend.base_url = url;
    }
    if let Some(markers) = lookup("EDGE_BACKEND_MARKERS") {
        config.backend.markers = split_list(&markers);
    }
    if let Some(addr) = lookup("EDGE_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(prefix) = lookup("EDGE_PROXY_PREFIX") {
        config.proxy.prefix = prefix;
    }
    if let Some(table) = lookup("EDGE_PROTECTED_PREFIXES") {
        config.policies = parse_policies(&table)?;
    }
    if let Some(creds) = lookup("EDGE_EDITOR_CREDENTIALS") {
        config.session.editor_credentials = split_list(&creds);
    }
    if let Some(flag) = lookup("EDGE_DEV_LOGIN") {
        config.session.dev_login = parse_bool("EDGE_DEV_LOGIN", &flag)?;
    }
    if let Some(level) = lookup("EDGE_LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("EDGE_LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => {
                return Err(ConfigError::Env {
                    key: "EDGE_LOG_FORMAT",
                    value: format,
                })
            }
        };
    }
    if let Some(secs) = lookup("EDGE_UPSTREAM_TIMEOUT_SECS") {
        config.timeouts.upstream_secs = secs.parse().map_err(|_| ConfigError::Env {
            key: "EDGE_UPSTREAM_TIMEOUT_SECS",
            value: secs.clone(),
        })?;
    }
    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            key,
            value: raw.to_string(),
        }),
    }
}

/// Parse `/dashboard=editor,/library=reader`.
fn parse_policies(raw: &str) -> Result<Vec<PolicyConfig>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|entry| {
            let invalid = || ConfigError::Env {
                key: "EDGE_PROTECTED_PREFIXES",
                value: entry.clone(),
            };
            let (prefix, role) = entry.split_once('=').ok_or_else(invalid)?;
            let required_role = role.trim().parse::<Role>().map_err(|_| invalid())?;
            Ok(PolicyConfig {
                path_prefix: prefix.trim().to_string(),
                required_role,
            })
        })
        .collect()
}
