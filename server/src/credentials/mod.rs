//! Credential records and the store that holds them.
//!
//! The store is an external collaborator of the session subsystem: issuance
//! looks credentials up by email, verification re-reads them by id. Only the
//! password-stripped [`UserProfile`] ever leaves this module's callers.
//!
//! # Invariants
//! - Emails are unique, compared case-insensitively.
//! - A credential's `password_hash` is a PHC string produced by
//!   [`crate::auth::password::hash_password`].

mod memory;

pub use memory::MemoryCredentialStore;

use serde::{Deserialize, Serialize};

/// Access level attached to a credential and carried in token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A stored user record, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
}

impl Credential {
    /// The password-stripped projection of this record.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// User projection returned to clients. Never contains the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Fields needed to create a credential. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
}

/// Errors raised by a credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Another credential already uses this email.
    DuplicateEmail(String),
    /// The backing store could not be read or written.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::Unavailable(reason) => write!(f, "credential store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Lookup and mutation interface over user credentials.
///
/// Implementations must be safe to share across request handlers; every
/// method takes `&self`.
pub trait CredentialStore: Send + Sync {
    /// Find a credential by id.
    fn find_by_id(&self, id: &str) -> Result<Option<Credential>, StoreError>;

    /// Find a credential by email, ignoring case.
    fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;

    /// Insert a new credential and return it with its assigned id.
    ///
    /// Fails with [`StoreError::DuplicateEmail`] if the email is taken.
    fn insert(&self, credential: NewCredential) -> Result<Credential, StoreError>;

    /// Replace the password hash of an existing credential.
    ///
    /// Returns `Ok(false)` if no credential has this id.
    fn update_password_hash(&self, id: &str, password_hash: String) -> Result<bool, StoreError>;

    /// Remove a credential. Returns `Ok(false)` if it did not exist.
    fn remove(&self, id: &str) -> Result<bool, StoreError>;
}
