//! Path prefix matching.
//!
//! # Responsibilities
//! - Match a request path against a configured prefix
//! - Capture the remainder (the wildcard suffix)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefixes match on `/` segment boundaries
//! - No regex to guarantee O(n) matching

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing `/` is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: trimmed.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` is the prefix itself or lies beneath it.
    pub fn matches_path(&self, path: &str) -> bool {
        self.suffix(path).is_some()
    }

    /// The part of `path` after the prefix, without its leading `/`.
    ///
    /// `None` when the path is outside the prefix.
    pub fn suffix<'a>(&self, path: &'a str) -> Option<&'a str> {
        // An empty prefix is the root and covers everything.
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some("")
        } else if let Some(suffix) = rest.strip_prefix('/') {
            Some(suffix)
        } else {
            None
        }
    }
}
