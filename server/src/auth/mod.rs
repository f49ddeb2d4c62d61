//! Authentication module.
//!
//! Token issuance and verification for the session subsystem.
//!
//! # Pre-conditions
//! - The signing secret is configured before any token is issued.
//!
//! # Post-conditions
//! - Verification never reveals which check rejected a token.
//!
//! # Invariants
//! - Every component here is stateless apart from the read-only signing key
//!   and the shared credential store.

pub mod error;
pub mod issuance;
pub mod jwt;
pub mod password;
pub mod signing_key;
pub mod verification;

pub use error::{AuthError, ErrorBody};
pub use issuance::{IssuanceService, Session};
pub use jwt::{
    Claims, CodecError, IssuedToken, TOKEN_SEGMENTS, TOKEN_TTL_SECS, TokenCodec,
    is_structurally_valid,
};
pub use signing_key::{SigningKey, SigningKeyError};
pub use verification::VerificationService;
