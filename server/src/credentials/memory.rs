//! In-memory credential store.
//!
//! # Thread Safety
//!
//! Records live behind a single `RwLock`, so concurrent verifications read in
//! parallel and writes (registration, password change) take exclusive access.
//!
//! # Invariants
//! - `by_email` holds exactly one entry per record, keyed by the lowercased email.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{Credential, CredentialStore, NewCredential, StoreError};

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<String, Credential>,
    /// Lowercased email -> id.
    by_email: HashMap<String, String>,
}

/// A credential store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<Records>,
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generate a random 128-bit id rendered as 32 hex characters.
fn new_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().map_or(0, |records| records.by_id.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Credential>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.by_id.get(id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    #[allow(clippy::significant_drop_tightening)] // The write lock must cover the check and the insert
    fn insert(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        let key = normalize_email(&credential.email);
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records.by_email.contains_key(&key) {
            return Err(StoreError::DuplicateEmail(credential.email));
        }

        let mut id = new_id();
        while records.by_id.contains_key(&id) {
            id = new_id();
        }

        let stored = Credential {
            id: id.clone(),
            email: credential.email.trim().to_string(),
            password_hash: credential.password_hash,
            role: credential.role,
            name: credential.name,
        };
        records.by_email.insert(key, id.clone());
        records.by_id.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_password_hash(&self, id: &str, password_hash: String) -> Result<bool, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        match records.by_id.get_mut(id) {
            Some(credential) => {
                credential.password_hash = password_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let Some(credential) = records.by_id.remove(id) else {
            return Ok(false);
        };
        records.by_email.remove(&normalize_email(&credential.email));
        Ok(true)
    }
}
