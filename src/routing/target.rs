//! Upstream target computation for the wildcard passthrough.
//!
//! # Responsibilities
//! - Rewrite `{prefix}/{suffix}?{query}` to `{upstream}/{suffix}?{query}`
//! - Refuse paths outside the configured prefix
//!
//! # Design Decisions
//! - Suffix taken from the raw request path, not the decoded one
//! - Query string passed through verbatim, never parsed

use std::fmt;

use axum::http::Uri;

use crate::error::EdgeError;
use crate::routing::matcher::PathPrefixMatcher;

/// Computed upstream location for one forwarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    upstream_base: String,
    path_suffix: String,
    query: Option<String>,
}

impl ProxyTarget {
    /// Full upstream URL as a string.
    pub fn url(&self) -> String {
        self.to_string()
    }

    /// Parse into a request URI for the outbound client.
    pub fn to_uri(&self) -> Result<Uri, EdgeError> {
        let url = self.url();
        url.parse::<Uri>()
            .map_err(|e| EdgeError::InvalidTarget(format!("{url}: {e}")))
    }
}

impl fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.upstream_base, self.path_suffix)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// The wildcard passthrough route: a prefix bound to an upstream base URL.
#[derive(Debug, Clone)]
pub struct ProxyRoute {
    matcher: PathPrefixMatcher,
    upstream_base: String,
}

impl ProxyRoute {
    pub fn new(prefix: impl Into<String>, upstream_base: impl Into<String>) -> Self {
        let upstream_base = upstream_base.into();
        Self {
            matcher: PathPrefixMatcher::new(prefix),
            upstream_base: upstream_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    /// Target for an inbound path and raw query; `None` outside the prefix.
    pub fn target(&self, path: &str, query: Option<&str>) -> Option<ProxyTarget> {
        let suffix = self.matcher.suffix(path)?;
        Some(ProxyTarget {
            upstream_base: self.upstream_base.clone(),
            path_suffix: suffix.to_string(),
            query: query.map(str::to_string),
        })
    }

    /// Target for an inbound URI.
    pub fn target_for_uri(&self, uri: &Uri) -> Option<ProxyTarget> {
        self.target(uri.path(), uri.query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> ProxyRoute {
        ProxyRoute::new("/api", "http://backend:8000/")
    }

    #[test]
    fn rewrites_path_and_keeps_query_verbatim() {
        let target = route()
            .target("/api/search/media", Some("q=a%20b&page=2&page=3"))
            .unwrap();
        assert_eq!(target.path_suffix, "search/media");
        assert_eq!(target.url(), "http://backend:8000/search/media?q=a%20b&page=2&page=3");
    }

    #[test]
    fn passthrough_example() {
        let route = ProxyRoute::new("/api/list-passthrough", "http://backend:8000");
        let target = route.target("/api/list-passthrough/admin/list", None).unwrap();
        assert_eq!(target.url(), "http://backend:8000/admin/list");
        assert_eq!(target.to_uri().unwrap().path(), "/admin/list");
    }

    #[test]
    fn never_targets_paths_outside_prefix() {
        assert_eq!(route().target("/apiary", None), None);
        assert_eq!(route().target("/dashboard", Some("x=1")), None);
    }

    #[test]
    fn bare_query_marker_is_kept() {
        let target = route().target("/api/jobs", Some("")).unwrap();
        assert_eq!(target.url(), "http://backend:8000/jobs?");
        let target = route().target("/api/jobs", None).unwrap();
        assert_eq!(target.url(), "http://backend:8000/jobs");
    }

    #[test]
    fn keeps_upstream_base_path() {
        let route = ProxyRoute::new("/api", "http://backend:8000/v2");
        let uri: Uri = "/api/items?id=7".parse().unwrap();
        let target = route.target_for_uri(&uri).unwrap();
        assert_eq!(target.url(), "http://backend:8000/v2/items?id=7");
    }
}
