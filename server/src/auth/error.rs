//! Error taxonomy surfaced by the session services and HTTP endpoints.
//!
//! Every variant maps to one HTTP status and a `{"error": "..."}` body. The
//! messages for `InvalidCredentials` and `Unauthenticated` are fixed so
//! responses never reveal which check failed.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::password::HashError;
use crate::credentials::StoreError;

/// Error returned by issuance, verification and the adjacent flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The request was malformed or failed validation.
    BadRequest(String),
    /// Unknown email or wrong password. The two are not distinguished.
    InvalidCredentials,
    /// Missing, malformed, forged, expired, or orphaned token.
    Unauthenticated,
    /// The subject resolved but its record vanished before the operation completed.
    NotFound,
    /// Registration with an email that is already taken.
    Conflict,
    /// The external credential store failed.
    Unavailable,
    /// A local failure such as hashing or signing.
    Internal,
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "{message}"),
            Self::InvalidCredentials => write!(f, "Invalid email or password"),
            Self::Unauthenticated => write!(f, "Invalid or expired token"),
            Self::NotFound => write!(f, "User not found"),
            Self::Conflict => write!(f, "Email is already registered"),
            Self::Unavailable => write!(f, "Service temporarily unavailable"),
            Self::Internal => write!(f, "Internal server error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::DuplicateEmail(_) => Self::Conflict,
            StoreError::Unavailable(reason) => {
                tracing::error!("credential store failure: {reason}");
                Self::Unavailable
            }
        }
    }
}

impl From<HashError> for AuthError {
    fn from(error: HashError) -> Self {
        tracing::error!("{error}");
        Self::Internal
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
