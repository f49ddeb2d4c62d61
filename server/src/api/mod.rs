//! HTTP surface of the session subsystem.
//!
//! All endpoints live under `/api/auth`. Every other path falls through the
//! edge route gate to a 404, since page rendering is not served here.

mod handlers;

pub use handlers::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, SuccessBody, ValidateResponse,
};

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::activity::ActivitySink;
use crate::auth::{IssuanceService, SigningKey, TokenCodec, VerificationService};
use crate::cookie::CookieAttributes;
use crate::credentials::CredentialStore;
use crate::gate::{RouteGate, route_gate};
use crate::time::TimeSource;

/// Mount point of the auth endpoints.
pub const API_PREFIX: &str = "/api/auth";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<IssuanceService>,
    pub verifier: Arc<VerificationService>,
    pub activity: Arc<dyn ActivitySink>,
    pub clock: Arc<dyn TimeSource>,
    pub cookie: CookieAttributes,
}

impl AppState {
    /// Wire issuance and verification to one store and one codec.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        key: SigningKey,
        clock: Arc<dyn TimeSource>,
        activity: Arc<dyn ActivitySink>,
        cookie_secure: bool,
    ) -> Self {
        let codec = Arc::new(TokenCodec::new(key, Arc::clone(&clock)));
        Self {
            issuer: Arc::new(IssuanceService::new(Arc::clone(&store), Arc::clone(&codec))),
            verifier: Arc::new(VerificationService::new(store, codec)),
            activity,
            clock,
            cookie: CookieAttributes::session(cookie_secure),
        }
    }
}

/// Build the application router: auth endpoints behind the edge route gate.
pub fn router(state: AppState, gate: RouteGate) -> Router {
    let auth = Router::new()
        .route("/login", post(handlers::login))
        .route("/validate", get(handlers::validate).post(handlers::validate))
        .route("/logout", post(handlers::logout))
        .route("/register", post(handlers::register))
        .route("/password", post(handlers::change_password))
        .with_state(state);

    Router::new()
        .nest(API_PREFIX, auth)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(Arc::new(gate), route_gate))
}
