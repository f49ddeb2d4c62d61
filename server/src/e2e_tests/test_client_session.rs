//! The client session manager against a real listener.

use std::sync::Arc;

use crate::auth::TOKEN_TTL_SECS;
use crate::client::{
    ClientError, CookieJar, DurableStore, HttpSessionApi, MemoryCookieJar, MemoryStore,
    SessionManager, SessionStatus, TOKEN_KEY,
};
use crate::cookie::{CookieAttributes, SESSION_COOKIE_NAME};
use crate::e2e_tests::helpers::*;

type HttpManager = SessionManager<HttpSessionApi, Arc<MemoryStore>, Arc<MemoryCookieJar>>;

/// Serve the router on an ephemeral port and return its origin.
fn serve(test: &TestServer) -> String {
    let router = test.router.clone();
    test.runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{addr}")
    })
}

fn manager(origin: &str, durable: &Arc<MemoryStore>, cookie: &Arc<MemoryCookieJar>) -> HttpManager {
    SessionManager::new(
        HttpSessionApi::new(origin),
        Arc::clone(durable),
        Arc::clone(cookie),
        CookieAttributes::session(false),
    )
}

#[test]
fn test_login_then_restore_after_restart() {
    let test = TestServer::new();
    let user = test.seed_user("a@x.com", "correct-password");
    let origin = serve(&test);
    let durable = Arc::new(MemoryStore::new());
    let cookie = Arc::new(MemoryCookieJar::new());

    let mut first = manager(&origin, &durable, &cookie);
    let logged_in = test
        .runtime
        .block_on(first.login("a@x.com", "correct-password"))
        .expect("login");
    assert_eq!(logged_in, user);
    let token = first.token().expect("token").to_string();
    assert_eq!(cookie.get(SESSION_COOKIE_NAME), Some(token.clone()));

    // A new manager over the same durable store, with the cookie lost.
    let fresh_cookie = Arc::new(MemoryCookieJar::new());
    let mut second = manager(&origin, &durable, &fresh_cookie);
    assert_eq!(test.runtime.block_on(second.initialize()), SessionStatus::Valid);
    assert_eq!(second.user(), Some(&user));
    assert_eq!(fresh_cookie.get(SESSION_COOKIE_NAME), Some(token));
}

#[test]
fn test_expired_session_is_purged_on_startup() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let origin = serve(&test);
    let durable = Arc::new(MemoryStore::new());
    let cookie = Arc::new(MemoryCookieJar::new());

    let mut manager = manager(&origin, &durable, &cookie);
    test.runtime
        .block_on(manager.login("a@x.com", "correct-password"))
        .expect("login");

    test.clock.advance_secs(TOKEN_TTL_SECS + 1);
    assert_eq!(test.runtime.block_on(manager.initialize()), SessionStatus::Invalid);
    assert_eq!(durable.get(TOKEN_KEY), None);
    assert_eq!(cookie.get(SESSION_COOKIE_NAME), None);
}

#[test]
fn test_bad_credentials_surface_server_message() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let origin = serve(&test);
    let durable = Arc::new(MemoryStore::new());
    let cookie = Arc::new(MemoryCookieJar::new());

    let mut manager = manager(&origin, &durable, &cookie);
    let result = test
        .runtime
        .block_on(manager.login("a@x.com", "wrong-password"));
    assert_eq!(
        result,
        Err(ClientError::Rejected {
            status: 401,
            message: "Invalid email or password".to_string(),
        })
    );
    assert_eq!(manager.status(), SessionStatus::Uninitialized);
    assert!(durable.is_empty());
}

#[test]
fn test_logout_clears_both_replicas() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let origin = serve(&test);
    let durable = Arc::new(MemoryStore::new());
    let cookie = Arc::new(MemoryCookieJar::new());

    let mut manager = manager(&origin, &durable, &cookie);
    test.runtime
        .block_on(manager.login("a@x.com", "correct-password"))
        .expect("login");

    let notification = test
        .runtime
        .block_on(async { manager.logout() })
        .expect("inside a runtime");
    test.runtime
        .block_on(notification)
        .expect("notification task");
    assert!(!manager.is_authenticated());
    assert!(durable.is_empty());
    assert_eq!(cookie.get(SESSION_COOKIE_NAME), None);
}
