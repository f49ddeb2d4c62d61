//! Server configuration module.
//!
//! Loads configuration for the session server from environment variables.
//!
//! # Environment Variables
//!
//! - `SESSION_JWT_SECRET`: HS256 signing secret, at least 32 bytes (required)
//! - `SESSION_LISTEN_PORT`: Port to listen on (default: `3000`)
//! - `SESSION_COOKIE_SECURE`: Mark the session cookie `Secure` (default: `false`)
//! - `SESSION_ADMIN_EMAIL` / `SESSION_ADMIN_PASSWORD`: Seed an admin credential
//!   at startup (optional, both or neither)
//!
//! # Invariants
//!
//! - `signing_key` always holds a validated secret
//! - `admin` is either fully specified or absent

use crate::auth::SigningKey;

/// Credentials of the admin account seeded at startup.
#[derive(Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Server configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()` or `from_lookup()`, every field holds a
/// validated value.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret used to sign and verify session tokens.
    pub signing_key: SigningKey,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// Optional admin account created at startup.
    pub admin: Option<AdminSeed>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

const JWT_SECRET: &str = "SESSION_JWT_SECRET";
const LISTEN_PORT: &str = "SESSION_LISTEN_PORT";
const COOKIE_SECURE: &str = "SESSION_COOKIE_SECURE";
const ADMIN_EMAIL: &str = "SESSION_ADMIN_EMAIL";
const ADMIN_PASSWORD: &str = "SESSION_ADMIN_PASSWORD";

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `SESSION_JWT_SECRET` is not set, or is shorter than 32 bytes
    /// - `SESSION_LISTEN_PORT` is set but not a valid port number
    /// - `SESSION_COOKIE_SECURE` is set but not `true` or `false`
    /// - only one of `SESSION_ADMIN_EMAIL` / `SESSION_ADMIN_PASSWORD` is set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            signing_key: Self::load_signing_key(&lookup)?,
            listen_port: Self::load_listen_port(&lookup)?,
            cookie_secure: Self::load_cookie_secure(&lookup)?,
            admin: Self::load_admin(&lookup)?,
        })
    }

    fn load_signing_key<F>(lookup: &F) -> Result<SigningKey, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(JWT_SECRET).ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET.to_string()))?;
        SigningKey::new(secret.into_bytes()).map_err(|e| ConfigError::InvalidValue {
            name: JWT_SECRET.to_string(),
            message: e.to_string(),
        })
    }

    fn load_listen_port<F>(lookup: &F) -> Result<u16, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LISTEN_PORT) {
            Some(value) => value
                .parse::<u16>()
                .ok()
                .filter(|port| *port != 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    name: LISTEN_PORT.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            None => Ok(Self::DEFAULT_PORT),
        }
    }

    fn load_cookie_secure<F>(lookup: &F) -> Result<bool, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(COOKIE_SECURE).as_deref() {
            None => Ok(false),
            Some("true" | "1") => Ok(true),
            Some("false" | "0") => Ok(false),
            Some(other) => Err(ConfigError::InvalidValue {
                name: COOKIE_SECURE.to_string(),
                message: format!("'{other}' is not a boolean (use true or false)"),
            }),
        }
    }

    fn load_admin<F>(lookup: &F) -> Result<Option<AdminSeed>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = lookup(ADMIN_EMAIL).filter(|v| !v.trim().is_empty());
        let password = lookup(ADMIN_PASSWORD).filter(|v| !v.is_empty());
        match (email, password) {
            (Some(email), Some(password)) => Ok(Some(AdminSeed { email, password })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(ADMIN_PASSWORD.to_string())),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(ADMIN_EMAIL.to_string())),
        }
    }
}
