//! Client session manager.
//!
//! Owns the client's view of the session: the token, the user it belongs to
//! and a status. The token itself lives in [`TokenReplicas`]; the manager
//! only mutates them through `&mut self`, so no two transitions interleave.
//!
//! # State machine
//! ```text
//! Uninitialized --initialize--> Validating --ok--> Valid
//!                                          \--err-> Invalid (replicas purged)
//! any --login ok--> Valid
//! any --logout----> Invalid (replicas purged)
//! ```
//!
//! # Invariants
//! - `Valid` implies both `token` and `user` are present.
//! - `Invalid` implies neither is present and both replicas are empty.

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::api::{ClientError, SessionApi};
use super::cookie_jar::CookieJar;
use super::replicas::TokenReplicas;
use super::store::DurableStore;
use crate::cookie::CookieAttributes;
use crate::credentials::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Validating,
    Valid,
    Invalid,
}

/// Snapshot of the client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub status: SessionStatus,
}

impl ClientSession {
    const fn empty(status: SessionStatus) -> Self {
        Self {
            token: None,
            user: None,
            status,
        }
    }
}

/// Keeps the client session and its two token replicas consistent.
pub struct SessionManager<A, D, C> {
    api: A,
    replicas: TokenReplicas<D, C>,
    session: ClientSession,
}

impl<A, D, C> SessionManager<A, D, C>
where
    A: SessionApi,
    D: DurableStore,
    C: CookieJar,
{
    pub const fn new(api: A, durable: D, cookie: C, attributes: CookieAttributes) -> Self {
        Self {
            api,
            replicas: TokenReplicas::new(durable, cookie, attributes),
            session: ClientSession::empty(SessionStatus::Uninitialized),
        }
    }

    pub const fn session(&self) -> &ClientSession {
        &self.session
    }

    pub const fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.status == SessionStatus::Valid
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }

    pub const fn replicas(&self) -> &TokenReplicas<D, C> {
        &self.replicas
    }

    /// Restore the session from whichever replica holds a token and confirm
    /// it with the server.
    ///
    /// With no token anywhere the server is not contacted. Any validation
    /// failure purges both replicas. Running this twice in a row leaves the
    /// same state as running it once.
    pub async fn initialize(&mut self) -> SessionStatus {
        self.session.status = SessionStatus::Validating;

        let reconciled = match self.replicas.reconcile() {
            Ok(Some(reconciled)) => reconciled,
            Ok(None) => {
                self.invalidate();
                return self.session.status;
            }
            Err(e) => {
                tracing::warn!("cannot reconcile session replicas: {e}");
                self.invalidate();
                return self.session.status;
            }
        };

        match self.api.validate(&reconciled.token).await {
            Ok(user) => {
                if let Err(e) = self.replicas.cache_user(&user) {
                    tracing::warn!("cannot cache session user: {e}");
                }
                tracing::debug!(user_id = %user.id, source = ?reconciled.source, "session restored");
                self.session = ClientSession {
                    token: Some(reconciled.token),
                    user: Some(user),
                    status: SessionStatus::Valid,
                };
            }
            Err(e) => {
                tracing::debug!("stored session rejected: {e}");
                self.invalidate();
            }
        }
        self.session.status
    }

    /// Log in and store the new token in both replicas.
    ///
    /// # Errors
    /// Returns the server's rejection or a transport error; the session and
    /// both replicas are then left exactly as they were. Returns
    /// `ClientError::Storage` if the durable store cannot take the token.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, ClientError> {
        let session = self.api.login(email, password).await?;
        self.replicas.commit(&session.token)?;
        if let Err(e) = self.replicas.cache_user(&session.user) {
            tracing::warn!("cannot cache session user: {e}");
        }

        self.session = ClientSession {
            token: Some(session.token),
            user: Some(session.user.clone()),
            status: SessionStatus::Valid,
        };
        Ok(session.user)
    }

    /// End the session locally and notify the server in the background.
    ///
    /// Local state is cleared regardless of the notification's outcome. The
    /// notification needs a Tokio runtime; outside one it is skipped and
    /// `None` is returned. The returned handle may be dropped.
    pub fn logout(&mut self) -> Option<JoinHandle<()>> {
        let token = self
            .session
            .token
            .take()
            .or_else(|| self.replicas.durable_token());
        let notification = match Handle::try_current() {
            Ok(runtime) => {
                let api = self.api.clone();
                Some(runtime.spawn(async move {
                    if let Err(e) = api.logout(token.as_deref()).await {
                        tracing::debug!("ignoring failed logout notification: {e}");
                    }
                }))
            }
            Err(_) => {
                tracing::debug!("no runtime; skipping logout notification");
                None
            }
        };
        self.invalidate();
        notification
    }

    fn invalidate(&mut self) {
        if let Err(e) = self.replicas.purge() {
            tracing::warn!("cannot purge session replicas: {e}");
        }
        self.session = ClientSession::empty(SessionStatus::Invalid);
    }
}
