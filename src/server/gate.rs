//! Auth Gate: decides which requests need a signed-in session.
//!
//! - ignored routes never see identity information
//! - public routes are open but get the caller's [`AuthState`]
//! - every other route requires a signed-in user

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use super::{error::ApiError, AppState};
use crate::auth::AuthState;
use crate::config::DEFAULT_AUTH_HEADER;

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const SIGN_UP_PATH: &str = "/sign-up";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Ignored,
    Public,
    Protected,
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    header: String,
    public_routes: Vec<String>,
    ignored_prefixes: Vec<String>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_HEADER)
    }
}

impl AuthGate {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            public_routes: vec!["/".to_string(), SIGN_IN_PATH.to_string(), SIGN_UP_PATH.to_string()],
            ignored_prefixes: vec!["/api/public".to_string()],
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn classify(&self, path: &str) -> RouteAccess {
        if is_static_asset(path)
            || self
                .ignored_prefixes
                .iter()
                .any(|prefix| path == prefix || path.starts_with(&format!("{}/", prefix)))
        {
            return RouteAccess::Ignored;
        }

        let trimmed = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        if self.public_routes.iter().any(|route| route == trimmed) {
            RouteAccess::Public
        } else {
            RouteAccess::Protected
        }
    }

    pub fn identify(&self, headers: &HeaderMap) -> AuthState {
        let user_id = headers.get(&self.header).and_then(|v| v.to_str().ok());
        AuthState::from_session(user_id)
    }
}

/// Paths ending in a file extension, e.g. `/favicon.ico`.
fn is_static_asset(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((stem, ext)) => {
            !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let access = state.gate.classify(&path);

    if access == RouteAccess::Ignored {
        return next.run(request).await;
    }

    let auth = state.gate.identify(request.headers());
    if access == RouteAccess::Protected && !auth.is_signed_in() {
        debug!("Rejecting anonymous request to {}", path);
        if path.starts_with("/api/") || path == "/api" {
            return ApiError::Unauthorized.into_response();
        }
        return Redirect::temporary(SIGN_IN_PATH).into_response();
    }

    request.extensions_mut().insert(auth);
    next.run(request).await
}
