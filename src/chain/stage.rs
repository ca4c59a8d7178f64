//! Chain stages and their decisions.
//!
//! A stage inspects the request context and either lets the request continue
//! or terminates it with a redirect or an error. Stages never see the body.

use std::fmt;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;

use crate::auth::{Authorization, AuthorizationGuard, IdentityResolver};
use crate::chain::context::RequestContext;
use crate::error::INTERNAL_ERROR;
use crate::observability::metrics;

/// Why a stage redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// Protected path, no principal.
    Unauthenticated,
    /// Principal present, role too low.
    Unauthorized,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::Unauthenticated => "unauthenticated",
            RedirectReason::Unauthorized => "unauthorized",
        }
    }
}

/// Result of running one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Redirect {
        location: String,
        reason: RedirectReason,
    },
    Error {
        status: StatusCode,
        message: String,
    },
}

/// One unit in the ordered interception sequence.
///
/// Returns a boxed future so stages stay object-safe; identity lookups may
/// suspend in implementations that fetch credentials remotely.
pub trait Stage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn run<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Decision>;
}

/// Resolves the session credential into a principal.
#[derive(Debug, Clone)]
pub struct IdentityStage {
    resolver: IdentityResolver,
}

impl IdentityStage {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self { resolver }
    }
}

impl Stage for IdentityStage {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn run<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Decision> {
        Box::pin(async move {
            let principal = self.resolver.resolve_headers(ctx.headers());
            match ctx.attach_principal(principal) {
                Ok(()) => Decision::Continue,
                Err(_) => {
                    tracing::error!(path = %ctx.path(), "Principal resolved twice");
                    Decision::Error {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        message: INTERNAL_ERROR.to_string(),
                    }
                }
            }
        })
    }
}

/// Applies the policy table to the resolved principal.
#[derive(Debug, Clone)]
pub struct GuardStage {
    guard: AuthorizationGuard,
}

impl GuardStage {
    pub fn new(guard: AuthorizationGuard) -> Self {
        Self { guard }
    }
}

impl Stage for GuardStage {
    fn name(&self) -> &'static str {
        "guard"
    }

    fn run<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Decision> {
        Box::pin(async move {
            match self.guard.authorize(ctx.principal(), ctx.path(), &ctx.return_to()) {
                Authorization::Allow => Decision::Continue,
                Authorization::Unauthenticated { location } => {
                    metrics::record_auth_redirect("unauthenticated");
                    Decision::Redirect {
                        location,
                        reason: RedirectReason::Unauthenticated,
                    }
                }
                Authorization::Unauthorized { location, .. } => {
                    metrics::record_auth_redirect("unauthorized");
                    Decision::Redirect {
                        location,
                        reason: RedirectReason::Unauthorized,
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PolicyEntry, PolicyTable, Role};
    use axum::http::{header, HeaderMap, HeaderValue, Method};

    fn ctx(path: &str, cookie: Option<&'static str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie {
            headers.insert(header::COOKIE, HeaderValue::from_static(cookie));
        }
        RequestContext::new(Method::GET, path, None, headers)
    }

    fn guard_stage() -> GuardStage {
        let table = PolicyTable::new(vec![PolicyEntry::new("/dashboard", Role::Editor)]);
        GuardStage::new(AuthorizationGuard::new(table, "/edit", "/"))
    }

    #[tokio::test]
    async fn identity_stage_attaches_principal() {
        let stage = IdentityStage::new(IdentityResolver::new("session_id", ["editor-secret"]));
        let mut ctx = ctx("/", Some("session_id=editor-secret"));

        assert_eq!(stage.run(&mut ctx).await, Decision::Continue);
        assert_eq!(ctx.principal().unwrap().role, Role::Editor);
    }

    #[tokio::test]
    async fn identity_stage_refuses_second_resolution() {
        let stage = IdentityStage::new(IdentityResolver::new("session_id", ["editor-secret"]));
        let mut ctx = ctx("/", None);

        assert_eq!(stage.run(&mut ctx).await, Decision::Continue);
        let second = stage.run(&mut ctx).await;
        assert!(matches!(second, Decision::Error { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn guard_stage_redirects_anonymous_to_login() {
        let mut ctx = ctx("/dashboard", None);
        ctx.attach_principal(None).unwrap();

        let decision = guard_stage().run(&mut ctx).await;
        assert_eq!(
            decision,
            Decision::Redirect {
                location: "/edit?returnTo=%2Fdashboard".into(),
                reason: RedirectReason::Unauthenticated,
            }
        );
    }

    #[tokio::test]
    async fn guard_stage_continues_off_policy() {
        let mut ctx = ctx("/mediaplayer/7", None);
        ctx.attach_principal(None).unwrap();
        assert_eq!(guard_stage().run(&mut ctx).await, Decision::Continue);
    }
}
