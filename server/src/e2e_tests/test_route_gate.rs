//! The edge route gate in front of the router.

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{Request, StatusCode};

use crate::e2e_tests::helpers::*;

#[test]
fn test_signed_in_user_is_sent_away_from_login() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let session = test.login("a@x.com", "correct-password");

    for page in ["/login", "/register"] {
        let response = test.get_with_cookie(page, &session.token);
        assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT, "{page}");
        assert_eq!(response.location(), Some("/dashboard"));
        assert!(response.set_cookies().is_empty());
    }
}

#[test]
fn test_bearer_header_counts_as_signed_in() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let session = test.login("a@x.com", "correct-password");

    let response = test.get("/login", Some(&session.token));
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
}

#[test]
fn test_protected_page_without_token_passes_through() {
    let test = TestServer::new();
    let response = test.get("/dashboard", None);
    // No page handlers are mounted, so anything let through is a 404.
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.location().is_none());
}

#[test]
fn test_malformed_cookie_is_cleared() {
    let test = TestServer::new();

    let protected = test.get_with_cookie("/projects/7", "garbage");
    assert_eq!(protected.status, StatusCode::NOT_FOUND);
    assert!(protected.set_cookies().iter().any(|c| clears_session_cookie(c)));

    let login = test.get_with_cookie("/login", "only.two");
    assert_eq!(login.status, StatusCode::NOT_FOUND);
    assert!(login.location().is_none());
    assert!(login.set_cookies().iter().any(|c| clears_session_cookie(c)));
}

#[test]
fn test_expired_but_well_shaped_token_still_redirects() {
    // The gate only checks shape; signature and expiry are the API's job.
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let session = test.login("a@x.com", "correct-password");
    test.clock.advance_secs(30 * 24 * 60 * 60);

    let response = test.get_with_cookie("/login", &session.token);
    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
}

#[test]
fn test_public_pages_clear_malformed_cookie() {
    let test = TestServer::new();
    for path in ["/", "/team"] {
        let response = test.get_with_cookie(path, "garbage");
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
        assert!(
            response.set_cookies().iter().any(|c| clears_session_cookie(c)),
            "{path}"
        );
    }
}

#[test]
fn test_assets_are_untouched() {
    let test = TestServer::new();
    for path in ["/_next/static/app.js", "/favicon.ico"] {
        let response = test.get_with_cookie(path, "garbage");
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{path}");
        assert!(response.set_cookies().is_empty(), "{path}");
    }
}

#[test]
fn test_bearer_still_counts_behind_malformed_cookie() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let session = test.login("a@x.com", "correct-password");

    let request = Request::builder()
        .uri("/login")
        .header(COOKIE, "auth-token=garbage")
        .header(AUTHORIZATION, format!("Bearer {}", session.token))
        .body(Body::empty())
        .expect("build request");
    let response = test.send(request);

    assert_eq!(response.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.location(), Some("/dashboard"));
    assert!(response.set_cookies().iter().any(|c| clears_session_cookie(c)));
}
