//! Identity resolution from the session credential.
//!
//! # Responsibilities
//! - Read the session cookie from request headers
//! - Map the credential to a `Principal` (or none)
//!
//! # Design Decisions
//! - Placeholder trust model: string equality against a configured editor set.
//!   Any other non-empty value is a reader. This is not a verified token.
//! - The credential never leaves the resolver; `Principal::id` is derived from
//!   the role, so serializing a principal cannot leak the cookie
//! - Pure function of the request; no caching between requests

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use axum::http::{header, HeaderMap};
use cookie::Cookie;
use serde::{Deserialize, Serialize};

/// Role carried by a principal. Ordered: `Reader < Editor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Editor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Reader => f.write_str("reader"),
            Role::Editor => f.write_str("editor"),
        }
    }
}

/// Returned when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role `{}`", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reader" => Ok(Role::Reader),
            "editor" => Ok(Role::Editor),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Resolved identity for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    /// Principal for `role`, identified by the role name.
    pub fn for_role(role: Role) -> Self {
        Self {
            id: role.to_string(),
            role,
        }
    }
}

/// Maps a session credential to a principal.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    cookie_name: String,
    editor_credentials: HashSet<String>,
}

impl IdentityResolver {
    pub fn new<I, S>(cookie_name: impl Into<String>, editor_credentials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cookie_name: cookie_name.into(),
            editor_credentials: editor_credentials
                .into_iter()
                .map(Into::into)
                .filter(|c: &String| !c.is_empty())
                .collect(),
        }
    }

    /// Resolve a raw credential value.
    pub fn resolve(&self, credential: Option<&str>) -> Option<Principal> {
        let credential = credential?;
        if credential.is_empty() {
            return None;
        }
        let role = if self.editor_credentials.contains(credential) {
            Role::Editor
        } else {
            Role::Reader
        };
        Some(Principal::for_role(role))
    }

    /// Resolve the principal for a request's headers.
    pub fn resolve_headers(&self, headers: &HeaderMap) -> Option<Principal> {
        let credential = cookie_value(headers, &self.cookie_name);
        self.resolve(credential.as_deref())
    }
}

/// Find a cookie by name across every `Cookie` header, percent-decoded.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse_encoded)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value_trimmed().to_string())
}
