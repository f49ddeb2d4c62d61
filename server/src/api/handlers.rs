//! Endpoint handlers.
//!
//! Password hashing runs on the blocking pool so Argon2 never stalls the
//! async workers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::activity::{Activity, ActivityKind, record_detached};
use crate::auth::{AuthError, ErrorBody, Session};
use crate::cookie::clear_cookie_header;
use crate::credentials::UserProfile;
use crate::gate::bearer_token;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub user: UserProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessBody {
    pub success: bool,
}

fn bad_body(rejection: &JsonRejection) -> AuthError {
    tracing::debug!("rejected request body: {rejection}");
    AuthError::BadRequest("Invalid JSON body".to_string())
}

/// Run CPU-heavy auth work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("auth worker failed: {e}");
        AuthError::Internal
    })?
}

/// `POST /api/auth/login`
pub(super) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Session>, AuthError> {
    let Json(request) = payload.map_err(|e| bad_body(&e))?;
    let issuer = Arc::clone(&state.issuer);
    let session = blocking(move || issuer.login(&request.email, &request.password)).await?;
    Ok(Json(session))
}

/// `GET|POST /api/auth/validate`
pub(super) async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ValidateResponse>, AuthError> {
    let user = state.verifier.verify(bearer_token(&headers))?;
    Ok(Json(ValidateResponse { user }))
}

/// `POST /api/auth/logout`
///
/// Tokens are stateless, so there is nothing to revoke. The response clears
/// the cookie and always succeeds.
pub(super) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Ok(user) = state.verifier.verify(bearer_token(&headers)) {
        tracing::info!(user_id = %user.id, "logout");
    }
    (
        StatusCode::OK,
        [(SET_COOKIE, clear_cookie_header(&state.cookie))],
        Json(SuccessBody { success: true }),
    )
}

/// `POST /api/auth/register`
pub(super) async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), AuthError> {
    let Json(request) = payload.map_err(|e| bad_body(&e))?;
    let issuer = Arc::clone(&state.issuer);
    let session = blocking(move || {
        issuer.register(&request.email, &request.password, &request.name)
    })
    .await?;

    record_detached(
        &state.activity,
        Activity {
            kind: ActivityKind::UserRegistered,
            user_id: session.user.id.clone(),
            at_ms: state.clock.now_ms(),
        },
    );
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/auth/password`
pub(super) async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessBody>, AuthError> {
    let user = state.verifier.verify(bearer_token(&headers))?;
    let Json(request) = payload.map_err(|e| bad_body(&e))?;

    let issuer = Arc::clone(&state.issuer);
    let user_id = user.id.clone();
    blocking(move || {
        issuer.change_password(&user_id, &request.current_password, &request.new_password)
    })
    .await?;

    record_detached(
        &state.activity,
        Activity {
            kind: ActivityKind::PasswordChanged,
            user_id: user.id,
            at_ms: state.clock.now_ms(),
        },
    );
    Ok(Json(SuccessBody { success: true }))
}

/// Fallback for every path without a handler.
pub(super) async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
        }),
    )
}
