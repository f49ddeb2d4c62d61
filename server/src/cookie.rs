//! The `auth-token` cookie: its attributes, `Set-Cookie` rendering and
//! `Cookie` header parsing.
//!
//! Shared by the server (logout and the route gate clear it) and the client
//! session manager (which writes it as a replica of the durable token).

use crate::auth::TOKEN_TTL_SECS;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "auth-token";

/// `SameSite` policy of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

/// Attributes written alongside the cookie value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: String,
    pub max_age_secs: u64,
    pub same_site: SameSite,
    pub secure: bool,
}

impl CookieAttributes {
    /// `Path=/`, 7-day `Max-Age`, `SameSite=Lax`.
    #[must_use]
    pub fn session(secure: bool) -> Self {
        Self {
            path: "/".to_string(),
            max_age_secs: TOKEN_TTL_SECS,
            same_site: SameSite::Lax,
            secure,
        }
    }
}

/// Render a `Set-Cookie` value storing `token`.
#[must_use]
pub fn set_cookie_header(token: &str, attributes: &CookieAttributes) -> String {
    render(token, attributes.max_age_secs, attributes)
}

/// Render a `Set-Cookie` value that deletes the session cookie.
#[must_use]
pub fn clear_cookie_header(attributes: &CookieAttributes) -> String {
    render("", 0, attributes)
}

fn render(value: &str, max_age_secs: u64, attributes: &CookieAttributes) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={value}; Path={}; Max-Age={max_age_secs}; SameSite={}",
        attributes.path, attributes.same_site
    );
    if attributes.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Find the session cookie's value in a `Cookie` request header.
///
/// An empty value counts as absent.
#[must_use]
pub fn find_session_cookie(cookie_header: &str) -> Option<&str> {
    cookie_header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == SESSION_COOKIE_NAME)
            .then(|| value.trim())
            .filter(|value| !value.is_empty())
    })
}
