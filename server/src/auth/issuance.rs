//! Issuance service: turns credentials into session tokens.
//!
//! # Post-conditions
//! - `login` never writes to the credential store.
//! - Unknown email and wrong password produce the same error after the same
//!   amount of hashing work.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::password::{self, MIN_PASSWORD_LENGTH};
use super::{AuthError, TokenCodec};
use crate::credentials::{CredentialStore, NewCredential, Role, UserProfile};

/// A user together with a freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

/// Validates credentials and issues tokens.
pub struct IssuanceService {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
}

impl IssuanceService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Authenticate by email and password.
    ///
    /// # Errors
    /// - `AuthError::BadRequest` if either field is empty.
    /// - `AuthError::InvalidCredentials` if the email is unknown or the
    ///   password does not match.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }

        let Some(credential) = self.store.find_by_email(email)? else {
            password::verify_against_dummy(password);
            tracing::debug!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(password, &credential.password_hash) {
            tracing::debug!(user_id = %credential.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue(&credential.profile())?;
        tracing::info!(user_id = %credential.id, "login succeeded");
        Ok(Session {
            user: credential.profile(),
            token,
        })
    }

    /// Create a new `user`-role credential and sign the new user in.
    ///
    /// # Errors
    /// - `AuthError::BadRequest` if the email, password or name is invalid.
    /// - `AuthError::Conflict` if the email is already registered.
    pub fn register(&self, email: &str, password: &str, name: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        let name = name.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::BadRequest("A valid email is required".to_string()));
        }
        validate_new_password(password)?;
        if name.is_empty() {
            return Err(AuthError::BadRequest("Name is required".to_string()));
        }

        self.create(email, password, name, Role::User)
    }

    /// Create a credential with an explicit role. Used to seed the bootstrap admin.
    ///
    /// # Errors
    /// - `AuthError::Conflict` if the email is already registered.
    pub fn create(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> Result<Session, AuthError> {
        let credential = self.store.insert(NewCredential {
            email: email.to_string(),
            password_hash: password::hash_password(password)?,
            role,
            name: name.to_string(),
        })?;

        let user = credential.profile();
        let token = self.issue(&user)?;
        tracing::info!(user_id = %user.id, role = %user.role, "credential created");
        Ok(Session { user, token })
    }

    /// Replace the password of an already-verified user.
    ///
    /// Tokens issued before the change stay valid until they expire.
    ///
    /// # Errors
    /// - `AuthError::BadRequest` if the new password is too short.
    /// - `AuthError::InvalidCredentials` if `current` does not match.
    /// - `AuthError::NotFound` if the record vanished.
    pub fn change_password(
        &self,
        user_id: &str,
        current: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(new_password)?;

        let credential = self.store.find_by_id(user_id)?.ok_or(AuthError::NotFound)?;
        if !password::verify_password(current, &credential.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let hash = password::hash_password(new_password)?;
        if !self.store.update_password_hash(user_id, hash)? {
            return Err(AuthError::NotFound);
        }
        tracing::info!(user_id, "password changed");
        Ok(())
    }

    fn issue(&self, user: &UserProfile) -> Result<String, AuthError> {
        self.codec
            .issue(&user.id, &user.email, user.role)
            .map(|issued| issued.token)
            .map_err(|e| {
                tracing::error!("{e}");
                AuthError::Internal
            })
    }
}

fn validate_new_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
