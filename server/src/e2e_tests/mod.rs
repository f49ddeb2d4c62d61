//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the full router
//! (route gate included) with a manual clock so expiry is deterministic.

#![cfg(test)]

mod helpers;

mod test_change_password;
mod test_client_session;
mod test_concurrent_verify;
mod test_login;
mod test_route_gate;
