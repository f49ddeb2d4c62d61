//! Common helpers for end-to-end tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tower::ServiceExt;

use crate::activity::{Activity, MemoryActivitySink};
use crate::api::{AppState, router};
use crate::auth::{ErrorBody, Session, SigningKey};
use crate::credentials::{MemoryCredentialStore, Role, UserProfile};
use crate::gate::{GateConfig, RouteGate};
use crate::testing::TEST_SECRET;
use crate::time::ManualTimeSource;

/// The full router over an in-memory store, a manual clock and a recording
/// activity sink.
pub struct TestServer {
    pub runtime: tokio::runtime::Runtime,
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualTimeSource>,
    pub store: Arc<MemoryCredentialStore>,
    pub activity: MemoryActivitySink,
}

impl TestServer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_activity(MemoryActivitySink::new())
    }

    #[must_use]
    pub fn with_activity(activity: MemoryActivitySink) -> Self {
        let clock = Arc::new(ManualTimeSource::default_start());
        let store = Arc::new(MemoryCredentialStore::new());
        let key = SigningKey::new(TEST_SECRET.to_vec()).expect("test secret is valid");
        let state = AppState::new(
            Arc::clone(&store) as _,
            key,
            Arc::clone(&clock) as _,
            Arc::new(activity.clone()),
            false,
        );
        let router = router(state.clone(), RouteGate::new(GateConfig::default()));
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");

        Self {
            runtime,
            router,
            state,
            clock,
            store,
            activity,
        }
    }

    /// Insert a `user`-role credential directly, bypassing the HTTP surface.
    pub fn seed_user(&self, email: &str, password: &str) -> UserProfile {
        self.state
            .issuer
            .create(email, password, "Seeded User", Role::User)
            .expect("seed user")
            .user
    }

    /// Send a request through the router and collect the response.
    pub fn send(&self, request: Request<Body>) -> TestResponse {
        self.runtime.block_on(async {
            let response = self
                .router
                .clone()
                .oneshot(request)
                .await
                .expect("router is infallible");
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .into_body()
                .collect()
                .await
                .expect("collect body")
                .to_bytes()
                .to_vec();
            TestResponse {
                status,
                headers,
                body,
            }
        })
    }

    /// `POST` a JSON body, optionally with a bearer token.
    pub fn post_json(&self, path: &str, body: &serde_json::Value, token: Option<&str>) -> TestResponse {
        self.post_raw(path, body.to_string(), token)
    }

    /// `POST` an arbitrary body labelled as JSON.
    pub fn post_raw(&self, path: &str, body: impl Into<Body>, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(body.into()).expect("build request"))
    }

    /// `GET` with an optional bearer token.
    pub fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).expect("build request"))
    }

    /// `GET` a page carrying the session cookie.
    pub fn get_with_cookie(&self, path: &str, token: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(COOKIE, format!("theme=dark; auth-token={token}"))
            .body(Body::empty())
            .expect("build request");
        self.send(request)
    }

    /// Log in over HTTP and return the session.
    pub fn login(&self, email: &str, password: &str) -> Session {
        let response = self.post_json(
            "/api/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
            None,
        );
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.text());
        response.json()
    }

    /// Wait until the detached activity tasks have recorded `count` entries.
    pub fn wait_for_activity(&self, count: usize) -> Vec<Activity> {
        for _ in 0..200 {
            let entries = self.activity.entries();
            if entries.len() >= count {
                return entries;
            }
            self.runtime
                .block_on(tokio::time::sleep(Duration::from_millis(5)));
        }
        self.activity.entries()
    }
}

/// A collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `error` field of an error response.
    #[must_use]
    pub fn error(&self) -> String {
        self.json::<ErrorBody>().error
    }

    /// Every `Set-Cookie` header value.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(axum::http::header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }
}

/// Whether a `Set-Cookie` value removes the session cookie.
#[must_use]
pub fn clears_session_cookie(set_cookie: &str) -> bool {
    set_cookie.starts_with("auth-token=;") && set_cookie.contains("Max-Age=0")
}
