//! Session collaborators: login entry point, dev login actions, session info.
//!
//! These set or clear the placeholder session cookie. They do not verify
//! anything; the credential is whatever the identity resolver accepts.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use serde::Deserialize;

use crate::chain::{redirect, CurrentPrincipal};
use crate::config::SessionConfig;

/// Layout-data route reporting the current principal.
pub const SESSION_PATH: &str = "/session";

const DEV_LOGIN_EDITOR: &str = "/dev/login/editor";
const DEV_LOGIN_READER: &str = "/dev/login/reader";
const DEV_LOGOUT: &str = "/dev/login/logout";

/// Every path the session routes claim under `config`, login path first.
pub fn served_paths(config: &SessionConfig) -> Vec<&str> {
    let mut paths = vec![config.login_path.as_str(), SESSION_PATH];
    if config.dev_login {
        paths.extend([DEV_LOGIN_EDITOR, DEV_LOGIN_READER, DEV_LOGOUT]);
    }
    paths
}

/// Shared state for the session routes.
#[derive(Debug, Clone)]
pub struct SessionRoutes {
    config: Arc<SessionConfig>,
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "returnTo")]
    pub return_to: Option<String>,
}

impl SessionRoutes {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn router(self) -> Router {
        let mut router = Router::new()
            .route(&self.config.login_path, get(login_entry))
            .route(SESSION_PATH, get(current_session));

        if self.config.dev_login {
            router = router
                .route(DEV_LOGIN_EDITOR, post(dev_login_editor))
                .route(DEV_LOGIN_READER, post(dev_login_reader))
                .route(DEV_LOGOUT, post(dev_logout));
        }

        router.with_state(self)
    }

    fn editor_credential(&self) -> &str {
        self.config
            .editor_credentials
            .iter()
            .find(|c| !c.is_empty())
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn session_cookie(&self, value: &str) -> Cookie<'static> {
        let max_age = i64::try_from(self.config.max_age_secs).unwrap_or(i64::MAX);
        Cookie::build((self.config.cookie_name.clone(), value.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.secure_cookie)
            .max_age(CookieDuration::seconds(max_age))
            .build()
    }

    fn expired_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie("");
        cookie.make_removal();
        cookie
    }

    /// Local absolute path or the configured default.
    fn safe_return_to(&self, requested: Option<&str>) -> String {
        match requested {
            Some(path) if is_local_path(path) => path.to_string(),
            _ => self.config.default_return_to.clone(),
        }
    }
}

/// `/x` is local; `//host`, `/\host` and absolute URLs are not.
fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/') && !matches!(chars.next(), Some('/') | Some('\\'))
}

fn redirect_with_cookie(location: &str, cookie: Cookie<'_>) -> Response {
    let mut response = redirect(location);
    match HeaderValue::from_str(&cookie.encoded().to_string()) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
    }
    response
}

/// Login entry point: issue the editor credential, return to the caller.
async fn login_entry(State(routes): State<SessionRoutes>, Query(query): Query<LoginQuery>) -> Response {
    let location = routes.safe_return_to(query.return_to.as_deref());
    tracing::info!(return_to = %location, "Session issued by login entry point");
    redirect_with_cookie(&location, routes.session_cookie(routes.editor_credential()))
}

async fn dev_login_editor(State(routes): State<SessionRoutes>) -> Response {
    let cookie = routes.session_cookie(routes.editor_credential());
    redirect_with_cookie(&routes.config.default_return_to, cookie)
}

async fn dev_login_reader(State(routes): State<SessionRoutes>) -> Response {
    let cookie = routes.session_cookie(&routes.config.reader_credential);
    redirect_with_cookie(&routes.config.home_path, cookie)
}

async fn dev_logout(State(routes): State<SessionRoutes>) -> Response {
    redirect_with_cookie(&routes.config.home_path, routes.expired_cookie())
}

/// `{"user": Principal | null}` for the current request.
async fn current_session(request: Request<Body>) -> Response {
    let user = request
        .extensions()
        .get::<CurrentPrincipal>()
        .and_then(|current| current.0.clone());
    Json(serde_json::json!({ "user": user })).into_response()
}
