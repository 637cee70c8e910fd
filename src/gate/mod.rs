//! Session gate - runs ahead of every browser page.
//!
//! Each request is evaluated once and either passes through (with the
//! session's [`Principal`] attached to the request extensions) or is
//! redirected to the login or access-denied page. JSON API routes, assets and
//! the API docs are excluded; API handlers authorize themselves through
//! [`crate::jwt::AuthUser`].

pub mod cookie;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::app::AppState;
use crate::authz::{PermissionTable, Principal};
use crate::jwt::JwtConfig;

pub use cookie::{cleared_session_cookie, read_cookie, session_cookie, SESSION_COOKIE};

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Reachable without a session.
    pub public_paths: Vec<String>,
    /// Prefixes the gate never evaluates.
    pub excluded_prefixes: Vec<String>,
    /// Adds `Secure` to the session cookie.
    pub secure_cookies: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            public_paths: vec![LOGIN_PATH.to_string(), SIGNUP_PATH.to_string()],
            excluded_prefixes: ["/api", "/assets", "/favicon.ico", "/docs", "/api-docs"]
                .into_iter()
                .map(String::from)
                .collect(),
            secure_cookies: false,
        }
    }
}

impl GateConfig {
    pub fn from_env() -> Self {
        let production = std::env::var("APP_ENV")
            .map(|env| matches!(env.to_lowercase().as_str(), "production" | "prod"))
            .unwrap_or(false);

        Self {
            secure_cookies: production,
            ..Self::default()
        }
    }

    /// Matches the prefix itself or anything below it, never a longer sibling
    /// such as `/apiary` for `/api`.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| public == path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MissingSession,
    InvalidSession,
    Forbidden,
}

impl RedirectReason {
    pub fn target(&self) -> &'static str {
        match self {
            RedirectReason::MissingSession | RedirectReason::InvalidSession => LOGIN_PATH,
            RedirectReason::Forbidden => ACCESS_DENIED_PATH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Not evaluated: excluded prefix or public page.
    Bypass,
    Pass(Principal),
    Redirect(RedirectReason),
}

/// Evaluates one request. Pure apart from debug logging.
pub fn evaluate(
    config: &GateConfig,
    table: &PermissionTable,
    jwt: &JwtConfig,
    path: &str,
    headers: &HeaderMap,
) -> GateDecision {
    if config.is_excluded(path) || config.is_public(path) {
        return GateDecision::Bypass;
    }

    let Some(token) = read_cookie(headers, SESSION_COOKIE) else {
        return GateDecision::Redirect(RedirectReason::MissingSession);
    };

    let Ok(claims) = jwt.verify(&token) else {
        return GateDecision::Redirect(RedirectReason::InvalidSession);
    };

    if !table.is_allowed(claims.role, path) {
        tracing::debug!(role = %claims.role, path, "role not allowed on page");
        return GateDecision::Redirect(RedirectReason::Forbidden);
    }

    GateDecision::Pass(claims.principal())
}

pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let decision = evaluate(&state.gate, &state.permissions, &state.jwt, &path, request.headers());

    match decision {
        GateDecision::Bypass => next.run(request).await,
        GateDecision::Pass(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        GateDecision::Redirect(reason) => {
            tracing::debug!(path = %path, reason = ?reason, to = reason.target(), "session gate redirect");
            Redirect::temporary(reason.target()).into_response()
        }
    }
}
