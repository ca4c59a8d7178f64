//! Per-request context shared by chain stages.

use axum::http::{HeaderMap, Method, Request};

use crate::auth::Principal;
use crate::http::request::RequestIdExt;

/// Immutable view of the inbound request plus the resolved principal.
///
/// The body is not part of the context; it stays with the request and is
/// consumed exactly once by the terminal handler.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    request_id: Option<String>,
    principal: Option<Principal>,
    resolved: bool,
}

/// Returned when a stage tries to resolve the principal a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalAlreadyResolved;

impl RequestContext {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self::new(
            request.method().clone(),
            request.uri().path(),
            request.uri().query(),
            request.headers().clone(),
        )
    }

    pub fn new(method: Method, path: &str, query: Option<&str>, headers: HeaderMap) -> Self {
        let request_id = headers.request_id().map(str::to_string);
        Self {
            method,
            path: path.to_string(),
            query: query.map(str::to_string),
            headers,
            request_id,
            principal: None,
            resolved: false,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Original path plus query, as the client sent it. A bare `?` survives.
    pub fn return_to(&self) -> String {
        match self.query.as_deref() {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Record the identity outcome. Only the first call succeeds.
    pub fn attach_principal(&mut self, principal: Option<Principal>) -> Result<(), PrincipalAlreadyResolved> {
        if self.resolved {
            return Err(PrincipalAlreadyResolved);
        }
        self.principal = principal;
        self.resolved = true;
        Ok(())
    }
}
