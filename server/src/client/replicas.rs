//! The two client-side copies of the session token.
//!
//! The token lives in the durable store and in the `auth-token` cookie. They
//! are treated as two replicas of one value with the durable store as the
//! authority:
//! - durable present: the cookie is overwritten with it if missing or different
//! - durable empty, cookie present: the durable store is backfilled from the cookie
//! - purge: both go, together with the cached user
//!
//! # Invariants
//! - After `reconcile`, `commit` or `purge` returns `Ok`, both replicas hold
//!   the same token or neither holds one.

use super::cookie_jar::CookieJar;
use super::store::{DurableStore, DurableStoreError, TOKEN_KEY, USER_KEY};
use crate::cookie::{CookieAttributes, SESSION_COOKIE_NAME};
use crate::credentials::UserProfile;

/// Which replica a reconciled token was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Durable,
    Cookie,
}

/// The single token both replicas agree on after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub token: String,
    pub source: TokenSource,
}

/// The durable store and the cookie jar, kept in agreement.
#[derive(Debug)]
pub struct TokenReplicas<D, C> {
    durable: D,
    cookie: C,
    attributes: CookieAttributes,
}

impl<D: DurableStore, C: CookieJar> TokenReplicas<D, C> {
    pub const fn new(durable: D, cookie: C, attributes: CookieAttributes) -> Self {
        Self {
            durable,
            cookie,
            attributes,
        }
    }

    pub const fn durable(&self) -> &D {
        &self.durable
    }

    pub const fn cookie(&self) -> &C {
        &self.cookie
    }

    /// The token in the durable store, if any. Empty values count as absent.
    pub fn durable_token(&self) -> Option<String> {
        self.durable.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// The token in the cookie, if any.
    pub fn cookie_token(&self) -> Option<String> {
        self.cookie
            .get(SESSION_COOKIE_NAME)
            .filter(|token| !token.is_empty())
    }

    /// Bring both replicas to one token and return it, or `None` if neither
    /// has one.
    pub fn reconcile(&self) -> Result<Option<Reconciled>, DurableStoreError> {
        match (self.durable_token(), self.cookie_token()) {
            (None, None) => Ok(None),
            (Some(token), cookie) => {
                if cookie.as_deref() != Some(token.as_str()) {
                    tracing::debug!(
                        had_cookie = cookie.is_some(),
                        "repairing session cookie from durable store"
                    );
                    self.write_cookie(&token);
                }
                Ok(Some(Reconciled {
                    token,
                    source: TokenSource::Durable,
                }))
            }
            (None, Some(token)) => {
                tracing::debug!("backfilling durable store from session cookie");
                self.durable.set(TOKEN_KEY, &token)?;
                Ok(Some(Reconciled {
                    token,
                    source: TokenSource::Cookie,
                }))
            }
        }
    }

    /// Store a new token: durable store first, then the cookie from it.
    pub fn commit(&self, token: &str) -> Result<(), DurableStoreError> {
        self.durable.set(TOKEN_KEY, token)?;
        self.write_cookie(token);
        Ok(())
    }

    /// Remove the token from both replicas and drop the cached user.
    ///
    /// Every removal is attempted even if an earlier one fails; the first
    /// error is returned. The cookie goes last and unconditionally.
    pub fn purge(&self) -> Result<(), DurableStoreError> {
        let token = self.durable.remove(TOKEN_KEY);
        let user = self.durable.remove(USER_KEY);
        self.cookie.remove(SESSION_COOKIE_NAME, &self.attributes);
        token.and(user)
    }

    /// Persist the user profile next to the token.
    pub fn cache_user(&self, user: &UserProfile) -> Result<(), DurableStoreError> {
        let json =
            serde_json::to_string(user).map_err(|e| DurableStoreError::Encode(e.to_string()))?;
        self.durable.set(USER_KEY, &json)
    }

    /// The cached user profile, if present and readable.
    pub fn cached_user(&self) -> Option<UserProfile> {
        let json = self.durable.get(USER_KEY)?;
        serde_json::from_str(&json)
            .map_err(|e| tracing::debug!("ignoring unreadable cached user: {e}"))
            .ok()
    }

    fn write_cookie(&self, token: &str) {
        self.cookie.set(SESSION_COOKIE_NAME, token, &self.attributes);
    }
}
