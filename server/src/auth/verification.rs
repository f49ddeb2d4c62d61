//! Verification service: turns a bearer token into the current user.
//!
//! # Invariants
//! - Fails closed: any codec error, and any token whose subject no longer
//!   exists, yields `AuthError::Unauthenticated`.
//! - The returned profile is read from the credential store on every call,
//!   never from the token claims.
//! - No caching and no side effects; concurrent calls are independent.

use std::sync::Arc;

use super::{AuthError, TokenCodec};
use crate::credentials::{CredentialStore, UserProfile};

/// Verifies tokens against the codec and the credential store.
pub struct VerificationService {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
}

impl VerificationService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Verify a token and resolve its subject.
    ///
    /// # Errors
    /// - `AuthError::Unauthenticated` if the token is absent or invalid in any way.
    /// - `AuthError::Unavailable` if the credential store itself fails.
    pub fn verify(&self, token: Option<&str>) -> Result<UserProfile, AuthError> {
        let Some(token) = token else {
            return Err(AuthError::Unauthenticated);
        };

        let claims = self.codec.parse(token).map_err(|e| {
            tracing::debug!("token rejected: {e}");
            AuthError::Unauthenticated
        })?;

        match self.store.find_by_id(&claims.sub)? {
            Some(credential) => Ok(credential.profile()),
            None => {
                tracing::debug!(user_id = %claims.sub, "token rejected: subject no longer exists");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
