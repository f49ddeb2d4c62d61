//! Signing secret for session tokens.
//!
//! # Pre-conditions
//! - The secret is at least [`SigningKey::MIN_LENGTH`] bytes.
//!
//! # Post-conditions
//! - `SigningKey` instances are immutable once created.
//!
//! # Invariants
//! - The secret is never empty and never printed by `Debug`.

use jsonwebtoken::{DecodingKey, EncodingKey};

/// Error returned when a signing secret is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningKeyError {
    /// The secret is empty.
    EmptySecret,
    /// The secret is shorter than the minimum length.
    TooShort { length: usize, minimum: usize },
}

impl std::fmt::Display for SigningKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "HS256 secret must not be empty"),
            Self::TooShort { length, minimum } => {
                write!(f, "HS256 secret is {length} bytes, need at least {minimum}")
            }
        }
    }
}

impl std::error::Error for SigningKeyError {}

/// HMAC-SHA256 secret shared by token issuance and verification.
///
/// Built once from configuration and handed to the codec, so tests can swap
/// in their own secret.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    /// Minimum accepted secret length in bytes (the HMAC-SHA256 output size).
    pub const MIN_LENGTH: usize = 32;

    /// Create a new signing key.
    ///
    /// # Errors
    /// Returns `SigningKeyError::EmptySecret` if the secret is empty, or
    /// `SigningKeyError::TooShort` if it is shorter than [`Self::MIN_LENGTH`].
    pub fn new(secret: Vec<u8>) -> Result<Self, SigningKeyError> {
        if secret.is_empty() {
            return Err(SigningKeyError::EmptySecret);
        }
        if secret.len() < Self::MIN_LENGTH {
            return Err(SigningKeyError::TooShort {
                length: secret.len(),
                minimum: Self::MIN_LENGTH,
            });
        }
        Ok(Self { secret })
    }

    pub(crate) fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(&self.secret)
    }

    pub(crate) fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(&self.secret)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("secret", &format_args!("<{} bytes redacted>", self.secret.len()))
            .finish()
    }
}
