//! Client side of the session subsystem.
//!
//! [`SessionManager`] keeps the token in a [`DurableStore`] and a
//! [`CookieJar`] and talks to the server through a [`SessionApi`].

mod api;
mod cookie_jar;
mod manager;
mod replicas;
mod store;

pub use api::{ClientError, HttpSessionApi, SessionApi};
pub use cookie_jar::{CookieJar, MemoryCookieJar, StoredCookie};
pub use manager::{ClientSession, SessionManager, SessionStatus};
pub use replicas::{Reconciled, TokenReplicas, TokenSource};
pub use store::{DurableStore, DurableStoreError, FileStore, MemoryStore, TOKEN_KEY, USER_KEY};
