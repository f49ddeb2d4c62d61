// Life of a request:
// 1. The edge route gate classifies the path and checks the cookie's shape
//     - auth-only page with a token: redirect to the landing page
//     - malformed token: clear the cookie
// 2. Auth endpoints under /api/auth:
//     - login/register: check credentials, issue a signed token
//     - validate: verify signature and expiry, then re-read the user
//     - logout: clear the cookie (tokens are stateless)
//
// System components:
//  - Token codec (HS256, 7 day lifetime)
//  - Credential store
//  - Client session manager keeping the durable store and cookie in step

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
// Forbid unwrap() in production code to prevent panics on bad input.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

pub mod activity;
pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod cookie;
pub mod credentials;
pub mod gate;
pub mod time;

#[cfg(test)]
mod e2e_tests;
