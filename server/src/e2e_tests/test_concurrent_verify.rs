//! Verification has no shared mutable state: concurrent requests with a mix
//! of good and bad tokens each get their own answer.

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Request, StatusCode};
use futures::future::join_all;
use tower::ServiceExt;

use crate::e2e_tests::helpers::*;

#[test]
fn test_concurrent_validations_are_independent() {
    let test = TestServer::new();
    let users: Vec<_> = (0..4)
        .map(|i| test.seed_user(&format!("user{i}@x.com"), "correct-password"))
        .collect();
    let tokens: Vec<String> = users
        .iter()
        .map(|user| test.login(&user.email, "correct-password").token)
        .collect();

    let results = test.runtime.block_on(async {
        let requests = (0..64).map(|i| {
            let router = test.router.clone();
            let token = if i % 3 == 0 {
                "not-a-token".to_string()
            } else {
                tokens[i % tokens.len()].clone()
            };
            tokio::spawn(async move {
                let request = Request::builder()
                    .uri("/api/auth/validate")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .expect("build request");
                let response = router.oneshot(request).await.expect("router is infallible");
                (i, response.status())
            })
        });
        join_all(requests).await
    });

    assert_eq!(results.len(), 64);
    for result in results {
        let (i, status) = result.expect("task completes");
        let expected = if i % 3 == 0 {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::OK
        };
        assert_eq!(status, expected, "request {i}");
    }
}
