//! Password changes by an authenticated user.

use axum::http::StatusCode;

use crate::activity::ActivityKind;
use crate::credentials::CredentialStore;
use crate::e2e_tests::helpers::*;

fn change(test: &TestServer, token: Option<&str>, current: &str, new: &str) -> TestResponse {
    test.post_json(
        "/api/auth/password",
        &serde_json::json!({ "currentPassword": current, "newPassword": new }),
        token,
    )
}

#[test]
fn test_change_password_flow() {
    let test = TestServer::new();
    let user = test.seed_user("a@x.com", "old-password");
    let session = test.login("a@x.com", "old-password");

    let response = change(&test, Some(&session.token), "old-password", "new-password");
    assert_eq!(response.status, StatusCode::OK);

    let old = test.post_json(
        "/api/auth/login",
        &serde_json::json!({ "email": "a@x.com", "password": "old-password" }),
        None,
    );
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
    assert_eq!(test.login("a@x.com", "new-password").user, user);

    let entries = test.wait_for_activity(1);
    assert_eq!(entries[0].kind, ActivityKind::PasswordChanged);
}

#[test]
fn test_change_password_requires_token() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "old-password");

    let response = change(&test, None, "old-password", "new-password");
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_token_is_checked_before_body() {
    let test = TestServer::new();
    let response = test.post_raw("/api/auth/password", "{broken", Some("not-a-token"));
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_wrong_current_password() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "old-password");
    let session = test.login("a@x.com", "old-password");

    let response = change(&test, Some(&session.token), "guess-password", "new-password");
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(test.login("a@x.com", "old-password").user.email, "a@x.com");
}

#[test]
fn test_short_new_password() {
    let test = TestServer::new();
    test.seed_user("a@x.com", "old-password");
    let session = test.login("a@x.com", "old-password");

    let response = change(&test, Some(&session.token), "old-password", "short");
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[test]
fn test_deleted_user_cannot_change_password() {
    let test = TestServer::new();
    let user = test.seed_user("a@x.com", "old-password");
    let session = test.login("a@x.com", "old-password");
    test.store.remove(&user.id).expect("remove");

    let response = change(&test, Some(&session.token), "old-password", "new-password");
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
