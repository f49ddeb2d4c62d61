//! Login over HTTP, and the token it returns.

use axum::http::StatusCode;

use crate::api::ValidateResponse;
use crate::credentials::Role;
use crate::e2e_tests::helpers::*;

#[test]
fn test_login_returns_user_and_token() {
    let test = TestServer::new();
    let seeded = test.seed_user("a@x.com", "correct-password");

    let session = test.login("a@x.com", "correct-password");
    assert_eq!(session.user, seeded);
    assert_eq!(session.user.role, Role::User);
    assert_eq!(session.token.split('.').count(), 3);

    let response = test.get("/api/auth/validate", Some(&session.token));
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json::<ValidateResponse>().user, seeded);
}

#[test]
fn test_login_response_never_contains_password_hash() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");

    let response = test.post_json(
        "/api/auth/login",
        &serde_json::json!({ "email": "a@x.com", "password": "correct-password" }),
        None,
    );
    assert_eq!(response.status, StatusCode::OK);
    let body = response.text();
    assert!(!body.contains("argon2"));
    assert!(!body.contains("password"));
}

#[test]
fn test_wrong_password_and_unknown_email_look_the_same() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");

    let wrong_password = test.post_json(
        "/api/auth/login",
        &serde_json::json!({ "email": "a@x.com", "password": "not-the-password" }),
        None,
    );
    let unknown_email = test.post_json(
        "/api/auth/login",
        &serde_json::json!({ "email": "nobody@x.com", "password": "not-the-password" }),
        None,
    );

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.error(), "Invalid email or password");
}

#[test]
fn test_missing_fields_are_bad_requests() {
    let test = TestServer::new();

    for body in [
        serde_json::json!({}),
        serde_json::json!({ "email": "a@x.com" }),
        serde_json::json!({ "password": "correct-password" }),
        serde_json::json!({ "email": "", "password": "" }),
    ] {
        let response = test.post_json("/api/auth/login", &body, None);
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[test]
fn test_malformed_json_is_a_bad_request() {
    let test = TestServer::new();
    let response = test.post_raw("/api/auth/login", "{\"email\": ", None);
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "Invalid JSON body");
}

#[test]
fn test_login_does_not_touch_store() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "correct-password");
    let before = test.store.len();

    test.login("a@x.com", "correct-password");
    test.post_json(
        "/api/auth/login",
        &serde_json::json!({ "email": "a@x.com", "password": "bad-password" }),
        None,
    );
    assert_eq!(test.store.len(), before);
}
