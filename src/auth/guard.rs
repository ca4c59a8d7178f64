//! Path-prefix authorization.
//!
//! # State Transitions
//! ```text
//! Unchecked → Authorized        (no policy entry matches the path)
//! Unchecked → Unauthenticated   (entry matches, no principal)  → redirect to login
//! Unchecked → Unauthorized      (entry matches, role too low)  → redirect home
//! Unchecked → Authorized        (entry matches, role sufficient)
//! ```
//!
//! # Design Decisions
//! - Policy table compiled at startup, immutable at runtime
//! - Longest prefix first; first match wins
//! - Prefixes match on segment boundaries: `/dashboard` covers
//!   `/dashboard` and `/dashboard/x`, not `/dashboards`
//! - Decisions are request-scoped and never cached

use crate::auth::identity::{Principal, Role};
use crate::config::PolicyConfig;
use crate::routing::PathPrefixMatcher;

/// Compiled policy entry.
#[derive(Debug, Clone)]
pub struct PolicyEntry {
    matcher: PathPrefixMatcher,
    required_role: Role,
}

impl PolicyEntry {
    pub fn new(path_prefix: impl Into<String>, required_role: Role) -> Self {
        Self {
            matcher: PathPrefixMatcher::new(path_prefix),
            required_role,
        }
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }
}

/// Read-only policy table, sorted longest prefix first.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    entries: Vec<PolicyEntry>,
}

impl PolicyTable {
    pub fn new(mut entries: Vec<PolicyEntry>) -> Self {
        // Stable sort keeps configuration order among equal lengths.
        entries.sort_by(|a, b| b.prefix().len().cmp(&a.prefix().len()));
        Self { entries }
    }

    pub fn from_config(policies: &[PolicyConfig]) -> Self {
        Self::new(
            policies
                .iter()
                .map(|p| PolicyEntry::new(p.path_prefix.clone(), p.required_role))
                .collect(),
        )
    }

    /// First entry, by longest prefix, that covers `path`.
    pub fn lookup(&self, path: &str) -> Option<&PolicyEntry> {
        self.entries.iter().find(|e| e.matcher.matches_path(path))
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allow,
    /// No principal on a protected path; send to the login entry point.
    Unauthenticated { location: String },
    /// Principal present but role too low; send home.
    Unauthorized {
        location: String,
        required: Role,
        actual: Role,
    },
}

/// Applies the policy table to a principal and path.
#[derive(Debug, Clone)]
pub struct AuthorizationGuard {
    table: PolicyTable,
    login_path: String,
    home_path: String,
}

impl AuthorizationGuard {
    pub fn new(table: PolicyTable, login_path: impl Into<String>, home_path: impl Into<String>) -> Self {
        Self {
            table,
            login_path: login_path.into(),
            home_path: home_path.into(),
        }
    }

    /// Decide for `path`; `return_to` is the original path plus query,
    /// echoed to the login entry point.
    pub fn authorize(&self, principal: Option<&Principal>, path: &str, return_to: &str) -> Authorization {
        let Some(entry) = self.table.lookup(path) else {
            return Authorization::Allow;
        };

        match principal {
            None => Authorization::Unauthenticated {
                location: login_location(&self.login_path, return_to),
            },
            Some(p) if p.role < entry.required_role => Authorization::Unauthorized {
                location: self.home_path.clone(),
                required: entry.required_role,
                actual: p.role,
            },
            Some(_) => Authorization::Allow,
        }
    }
}

/// `login?returnTo=<encoded original>`.
fn login_location(login_path: &str, return_to: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("returnTo", return_to)
        .finish();
    format!("{login_path}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> AuthorizationGuard {
        let table = PolicyTable::new(vec![
            PolicyEntry::new("/dashboard", Role::Editor),
            PolicyEntry::new("/library", Role::Reader),
            PolicyEntry::new("/library/restricted", Role::Editor),
        ]);
        AuthorizationGuard::new(table, "/edit", "/")
    }

    fn principal(role: Role) -> Principal {
        Principal {
            id: "tester".into(),
            role,
        }
    }

    #[test]
    fn unprotected_paths_always_allow() {
        let g = guard();
        for path in ["/", "/api/list", "/dashboards", "/mediaplayer/1"] {
            assert_eq!(g.authorize(None, path, path), Authorization::Allow, "{path}");
        }
    }

    #[test]
    fn missing_principal_redirects_to_login_with_return_target() {
        let decision = guard().authorize(None, "/dashboard/items", "/dashboard/items?page=2&q=a b");
        let Authorization::Unauthenticated { location } = decision else {
            panic!("expected login redirect, got {decision:?}");
        };
        assert!(location.starts_with("/edit?returnTo="));

        let query = location.split_once('?').unwrap().1;
        let (key, value) = url::form_urlencoded::parse(query.as_bytes()).next().unwrap();
        assert_eq!(key, "returnTo");
        assert_eq!(value, "/dashboard/items?page=2&q=a b");
    }

    #[test]
    fn reader_on_editor_area_goes_home() {
        let decision = guard().authorize(Some(&principal(Role::Reader)), "/dashboard", "/dashboard");
        assert_eq!(
            decision,
            Authorization::Unauthorized {
                location: "/".into(),
                required: Role::Editor,
                actual: Role::Reader,
            }
        );
    }

    #[test]
    fn sufficient_role_is_allowed() {
        let g = guard();
        assert_eq!(
            g.authorize(Some(&principal(Role::Editor)), "/dashboard", "/dashboard"),
            Authorization::Allow
        );
        assert_eq!(
            g.authorize(Some(&principal(Role::Reader)), "/library/a", "/library/a"),
            Authorization::Allow
        );
    }

    #[test]
    fn longest_prefix_wins() {
        let g = guard();
        let decision = g.authorize(
            Some(&principal(Role::Reader)),
            "/library/restricted/x",
            "/library/restricted/x",
        );
        assert!(matches!(decision, Authorization::Unauthorized { required: Role::Editor, .. }));
        assert_eq!(g.table.lookup("/library/restricted/x").unwrap().prefix(), "/library/restricted");
    }
}
