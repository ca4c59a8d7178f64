//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, paths and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::auth::Role;
use crate::config::schema::EdgeConfig;
use crate::http::session::served_paths;
use crate::routing::PathPrefixMatcher;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("backend.base_url `{0}` must be an absolute http URL with a host")]
    BackendUrl(String),

    #[error("{field} `{value}` must start with `/`")]
    NotAbsolutePath { field: &'static str, value: String },

    #[error("session.cookie_name must not be empty")]
    EmptyCookieName,

    #[error("session.editor_credentials must contain at least one non-empty value")]
    NoEditorCredentials,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("{field} `{value}` must not contain route syntax (`{{`, `}}`, `*`, `:`)")]
    RouteSyntax { field: &'static str, value: String },

    #[error("proxy.prefix `{prefix}` covers `{path}`, which the edge serves itself")]
    ProxyShadowsRoute { prefix: String, path: String },

    #[error("session.login_path `{0}` collides with another session route")]
    LoginPathCollision(String),

    #[error("{field} `{path}` is covered by policy `{policy}` and would redirect to itself")]
    RedirectLoop {
        field: &'static str,
        path: String,
        policy: String,
    },
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let backend_ok = Url::parse(&config.backend.base_url)
        .map(|u| u.scheme() == "http" && u.host_str().is_some())
        .unwrap_or(false);
    if !backend_ok {
        errors.push(ValidationError::BackendUrl(config.backend.base_url.clone()));
    }

    let mut check_path = |field: &'static str, value: &str| {
        if !value.starts_with('/') {
            errors.push(ValidationError::NotAbsolutePath {
                field,
                value: value.to_string(),
            });
        }
    };
    check_path("proxy.prefix", &config.proxy.prefix);
    check_path("session.login_path", &config.session.login_path);
    check_path("session.home_path", &config.session.home_path);
    check_path("session.default_return_to", &config.session.default_return_to);
    for policy in &config.policies {
        check_path("policies.path_prefix", &policy.path_prefix);
    }

    if config.session.cookie_name.trim().is_empty() {
        errors.push(ValidationError::EmptyCookieName);
    }
    if !config.session.editor_credentials.iter().any(|c| !c.is_empty()) {
        errors.push(ValidationError::NoEditorCredentials);
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    check_routes(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Paths become axum routes; overlapping or templated ones panic at startup.
fn check_routes(config: &EdgeConfig, errors: &mut Vec<ValidationError>) {
    let login_path = &config.session.login_path;
    for (field, value) in [("proxy.prefix", &config.proxy.prefix), ("session.login_path", login_path)] {
        if value.contains(['{', '}', '*', ':']) {
            errors.push(ValidationError::RouteSyntax {
                field,
                value: value.clone(),
            });
        }
    }

    let served = served_paths(&config.session);
    if served[1..].contains(&login_path.as_str()) {
        errors.push(ValidationError::LoginPathCollision(login_path.clone()));
    }

    let proxy = PathPrefixMatcher::new(config.proxy.prefix.as_str());
    if config.proxy.prefix.starts_with('/') {
        for path in served.iter().filter(|p| proxy.matches_path(p)) {
            errors.push(ValidationError::ProxyShadowsRoute {
                prefix: config.proxy.prefix.clone(),
                path: path.to_string(),
            });
        }
    }

    // Anonymous users are sent to the login path, readers to home.
    for policy in &config.policies {
        let matcher = PathPrefixMatcher::new(policy.path_prefix.as_str());
        let mut loops = vec![("session.login_path", login_path)];
        if policy.required_role > Role::Reader {
            loops.push(("session.home_path", &config.session.home_path));
        }
        for (field, path) in loops {
            if matcher.matches_path(path) {
                errors.push(ValidationError::RedirectLoop {
                    field,
                    path: path.clone(),
                    policy: policy.path_prefix.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&EdgeConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = EdgeConfig::default();
        config.backend.base_url = "backend:8000".into();
        config.proxy.prefix = "api".into();
        config.session.editor_credentials.clear();
        config.timeouts.upstream_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NoEditorCredentials));
        assert!(errors.contains(&ValidationError::ZeroTimeout("upstream_secs")));
    }

    #[test]
    fn rejects_proxy_prefix_over_session_routes() {
        let mut config = EdgeConfig::default();
        config.proxy.prefix = "/session".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::ProxyShadowsRoute {
                prefix: "/session".into(),
                path: "/session".into(),
            }])
        );

        config.proxy.prefix = "/".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn dev_routes_count_only_when_enabled() {
        let mut config = EdgeConfig::default();
        config.proxy.prefix = "/dev".into();
        assert_eq!(validate_config(&config), Ok(()));

        config.session.dev_login = true;
        assert_eq!(validate_config(&config).unwrap_err().len(), 3);
    }

    #[test]
    fn rejects_route_syntax() {
        let mut config = EdgeConfig::default();
        config.proxy.prefix = "/api/{version}".into();
        config.session.login_path = "/edit/*rest".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::RouteSyntax {
            field: "proxy.prefix",
            value: "/api/{version}".into(),
        }));
        assert!(errors.contains(&ValidationError::RouteSyntax {
            field: "session.login_path",
            value: "/edit/*rest".into(),
        }));
    }

    #[test]
    fn rejects_login_path_on_session_route() {
        let mut config = EdgeConfig::default();
        config.session.login_path = "/session".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::LoginPathCollision("/session".into())])
        );
    }

    #[test]
    fn rejects_redirect_loops() {
        let mut config = EdgeConfig::default();
        config.session.login_path = "/dashboard/login".into();
        config.session.home_path = "/jobs".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::RedirectLoop {
                    field: "session.login_path",
                    path: "/dashboard/login".into(),
                    policy: "/dashboard".into(),
                },
                ValidationError::RedirectLoop {
                    field: "session.home_path",
                    path: "/jobs".into(),
                    policy: "/jobs".into(),
                },
            ]
        );
    }

    #[test]
    fn reader_policy_on_home_is_not_a_loop() {
        let mut config = EdgeConfig::default();
        config.policies.push(crate::config::PolicyConfig {
            path_prefix: "/".into(),
            required_role: Role::Reader,
        });
        config.session.login_path = "/edit".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::RedirectLoop {
                field: "session.login_path",
                path: "/edit".into(),
                policy: "/".into(),
            }]
        );
    }

    #[test]
    fn rejects_non_http_backend() {
        let mut config = EdgeConfig::default();
        config.backend.base_url = "ftp://backend".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::BackendUrl(_)));
    }
}
