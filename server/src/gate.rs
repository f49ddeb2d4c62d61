//! Edge route gate.
//!
//! Runs as middleware in front of page routes, before any page handler and
//! independently of the verification service. It only checks a token's shape
//! (three dot-separated segments). It never checks the signature, expiry, or
//! whether the subject exists.
//!
//! The gate is advisory. A forged or expired token with the right shape gets
//! through, and an unauthenticated request to a protected page is allowed and
//! logged rather than redirected. Authorization is enforced only by the
//! verification service inside each protected handler.
//!
//! What it does act on:
//! - A cookie with the wrong shape, on any page outside the API and static
//!   assets: the response clears the `auth-token` cookie.
//! - An auth-only page (login, register) requested with a well-shaped token:
//!   temporary redirect to the landing page.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::is_structurally_valid;
use crate::cookie::{CookieAttributes, clear_cookie_header, find_session_cookie};

/// How the gate treats a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Pages that need a signed-in user.
    Protected,
    /// Pages only useful to signed-out users, such as the login page.
    AuthOnly,
    /// Everything else, including API and static asset paths.
    Public,
}

/// What the gate does with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Pass the request to the page handler.
    Allow,
    /// Answer with a temporary redirect to this location.
    Redirect(String),
}

/// Result of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub class: RouteClass,
    pub decision: GateDecision,
    /// The presented token had the wrong shape; the cookie copy gets cleared.
    pub clear_cookie: bool,
}

/// Path prefixes and redirect target used by the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub protected_prefixes: Vec<String>,
    pub auth_only_prefixes: Vec<String>,
    /// Where signed-in users are sent when they open an auth-only page.
    pub landing_path: String,
    pub cookie_secure: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: ["/dashboard", "/projects", "/profile", "/admin"]
                .map(String::from)
                .to_vec(),
            auth_only_prefixes: ["/login", "/register"].map(String::from).to_vec(),
            landing_path: "/dashboard".to_string(),
            cookie_secure: false,
        }
    }
}

/// Classifies paths and applies the structural token check.
#[derive(Debug, Clone, Default)]
pub struct RouteGate {
    config: GateConfig,
}

impl RouteGate {
    #[must_use]
    pub const fn new(config: GateConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if is_exempt(path) {
            return RouteClass::Public;
        }
        if matches_any(path, &self.config.protected_prefixes) {
            return RouteClass::Protected;
        }
        if matches_any(path, &self.config.auth_only_prefixes) {
            return RouteClass::AuthOnly;
        }
        RouteClass::Public
    }

    /// Decide what to do with a request for `path` carrying `presented`.
    ///
    /// Exempt paths (API, framework internals, static files) are never
    /// touched. On every other path a malformed cookie is cleared, and the
    /// first well-shaped token, cookie before bearer, counts as signed in.
    #[must_use]
    pub fn evaluate(&self, path: &str, presented: PresentedToken<'_>) -> GateOutcome {
        if is_exempt(path) {
            return GateOutcome {
                class: RouteClass::Public,
                decision: GateDecision::Allow,
                clear_cookie: false,
            };
        }

        let class = self.classify(path);
        let clear_cookie = presented.malformed_cookie();
        let has_token = presented.usable().is_some();
        if clear_cookie {
            tracing::debug!(path, "clearing malformed session cookie");
        }

        let decision = match (class, has_token) {
            (RouteClass::AuthOnly, true) => GateDecision::Redirect(self.config.landing_path.clone()),
            (RouteClass::Protected, false) => {
                tracing::warn!(path, "unauthenticated request to protected page allowed (advisory gate)");
                GateDecision::Allow
            }
            _ => GateDecision::Allow,
        };

        GateOutcome {
            class,
            decision,
            clear_cookie,
        }
    }

    #[must_use]
    pub fn cookie_attributes(&self) -> CookieAttributes {
        CookieAttributes::session(self.config.cookie_secure)
    }
}

/// API routes, framework internals and files with an extension are never gated.
fn is_exempt(path: &str) -> bool {
    path.starts_with("/api/")
        || path.starts_with("/_next/")
        || path
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.contains('.'))
}

fn matches_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        path == prefix
            || path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// The tokens a request carries to the edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentedToken<'a> {
    /// Value of the `auth-token` cookie.
    pub cookie: Option<&'a str>,
    /// Token from an `Authorization: Bearer` header.
    pub bearer: Option<&'a str>,
}

impl<'a> PresentedToken<'a> {
    #[must_use]
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        Self {
            cookie: headers
                .get_all(COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .find_map(find_session_cookie),
            bearer: bearer_token(headers),
        }
    }

    /// Only a cookie.
    #[must_use]
    pub const fn cookie(token: &'a str) -> Self {
        Self {
            cookie: Some(token),
            bearer: None,
        }
    }

    /// The cookie has a value but not the shape of a token.
    #[must_use]
    pub fn malformed_cookie(&self) -> bool {
        self.cookie.is_some_and(|token| !is_structurally_valid(token))
    }

    /// The well-shaped cookie, else the well-shaped bearer token.
    #[must_use]
    pub fn usable(&self) -> Option<&'a str> {
        self.cookie
            .filter(|token| is_structurally_valid(token))
            .or_else(|| self.bearer.filter(|token| is_structurally_valid(token)))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Axum middleware applying [`RouteGate::evaluate`] to every request.
pub async fn route_gate(
    State(gate): State<Arc<RouteGate>>,
    request: Request,
    next: Next,
) -> Response {
    let outcome = gate.evaluate(
        request.uri().path(),
        PresentedToken::from_headers(request.headers()),
    );

    let mut response = match outcome.decision {
        GateDecision::Redirect(location) => Redirect::temporary(&location).into_response(),
        GateDecision::Allow => next.run(request).await,
    };

    if outcome.clear_cookie {
        match HeaderValue::from_str(&clear_cookie_header(&gate.cookie_attributes())) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("failed to build cookie header: {e}"),
        }
    }
    response
}
