//! Session token codec.
//!
//! Issues and parses HS256 JSON Web Tokens carrying the session claims.
//!
//! # Pre-conditions
//! - The codec is constructed with a validated [`SigningKey`].
//!
//! # Post-conditions
//! - `parse` returns claims only if the token is well-formed, carries a valid
//!   signature, and has not expired.
//!
//! # Invariants
//! - The codec holds no mutable state; concurrent calls never interfere.
//! - Checks run in a fixed order: structure, then signature, then expiry.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};

use super::SigningKey;
use crate::credentials::Role;
use crate::time::TimeSource;

/// Lifetime of every session token: 7 days.
pub const TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Number of dot-separated segments in a token (header.payload.signature).
pub const TOKEN_SEGMENTS: usize = 3;

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the credential id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    /// Issued-at, seconds since Unix epoch.
    pub iat: u64,
    /// Expires-at, seconds since Unix epoch. Always `iat + TOKEN_TTL_SECS`.
    pub exp: u64,
}

/// A freshly signed token together with the claims it encodes.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Error returned when issuing or parsing a token fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The token does not decompose into header, payload and signature.
    MalformedToken,
    /// The signature does not verify against the signing secret.
    BadSignature,
    /// The token's expiry time has passed.
    Expired,
    /// The token could not be signed.
    Signing(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedToken => write!(f, "malformed token"),
            Self::BadSignature => write!(f, "invalid token signature"),
            Self::Expired => write!(f, "token has expired"),
            Self::Signing(reason) => write!(f, "failed to sign token: {reason}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Cheap shape check: exactly three dot-separated segments.
///
/// This is not verification. A forged or expired token passes.
#[must_use]
pub fn is_structurally_valid(token: &str) -> bool {
    token.split('.').count() == TOKEN_SEGMENTS
}

/// Creates and parses signed session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    key: SigningKey,
    clock: Arc<dyn TimeSource>,
}

impl TokenCodec {
    #[must_use]
    pub fn new(key: SigningKey, clock: Arc<dyn TimeSource>) -> Self {
        Self { key, clock }
    }

    /// Issue a token for the given subject, valid for [`TOKEN_TTL_SECS`] from now.
    ///
    /// # Errors
    /// Returns `CodecError::Signing` if the claims cannot be encoded.
    pub fn issue(&self, subject: &str, email: &str, role: Role) -> Result<IssuedToken, CodecError> {
        let iat = self.clock.now_secs();
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            role,
            iat,
            exp: iat.saturating_add(TOKEN_TTL_SECS),
        };
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Sign arbitrary claims as-is.
    ///
    /// # Errors
    /// Returns `CodecError::Signing` if the claims cannot be encoded.
    pub fn sign(&self, claims: &Claims) -> Result<String, CodecError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.key.encoding_key(),
        )
        .map_err(|e| CodecError::Signing(e.to_string()))
    }

    /// Parse and verify a token.
    ///
    /// # Errors
    /// - `CodecError::MalformedToken` if the token is not three segments of
    ///   base64url-encoded header and claims.
    /// - `CodecError::BadSignature` if the signature does not verify.
    /// - `CodecError::Expired` if the current time is past `exp`.
    pub fn parse(&self, token: &str) -> Result<Claims, CodecError> {
        check_structure(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the injected clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.key.decoding_key(), &validation)
            .map_err(map_jwt_error)?
            .claims;

        if self.clock.now_secs() > claims.exp {
            return Err(CodecError::Expired);
        }

        Ok(claims)
    }
}

/// Rejects anything that is not `header.payload.signature` with a decodable
/// HS256 header and claims payload.
///
/// Running this before signature verification means any decode failure that
/// `jsonwebtoken` reports afterwards comes from the signature segment.
fn check_structure(token: &str) -> Result<(), CodecError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, signature] = segments.as_slice() else {
        return Err(CodecError::MalformedToken);
    };
    if signature.is_empty() {
        return Err(CodecError::MalformedToken);
    }

    let header = decode_header(token).map_err(|_| CodecError::MalformedToken)?;
    if header.alg != Algorithm::HS256 {
        return Err(CodecError::BadSignature);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| CodecError::MalformedToken)?;
    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|_| CodecError::MalformedToken)?;
    if claims.sub.is_empty() {
        return Err(CodecError::MalformedToken);
    }

    Ok(())
}

/// Maps jsonwebtoken errors to our `CodecError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> CodecError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm | ErrorKind::Base64(_) => {
            CodecError::BadSignature
        }
        ErrorKind::ExpiredSignature => CodecError::Expired,
        ErrorKind::InvalidToken
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => CodecError::MalformedToken,
        // Anything unexpected fails closed.
        _ => CodecError::BadSignature,
    }
}
