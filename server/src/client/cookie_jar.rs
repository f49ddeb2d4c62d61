//! Client-side cookie jar holding the `auth-token` replica.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cookie::CookieAttributes;

/// Cookie storage as seen by client code.
///
/// Writes are infallible: a jar that cannot store a cookie simply does not
/// have it on the next read, which reconciliation then repairs.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, attributes: &CookieAttributes);
    fn remove(&self, name: &str, attributes: &CookieAttributes);
}

impl<T: CookieJar + ?Sized> CookieJar for Arc<T> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        (**self).set(name, value, attributes);
    }

    fn remove(&self, name: &str, attributes: &CookieAttributes) {
        (**self).remove(name, attributes);
    }
}

/// A stored cookie value with the attributes it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub value: String,
    pub attributes: CookieAttributes,
}

/// A cookie jar kept in memory.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cookie stored under `name`, with its attributes.
    #[must_use]
    pub fn stored(&self, name: &str) -> Option<StoredCookie> {
        self.cookies.lock().ok()?.get(name).cloned()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.stored(name)
            .map(|cookie| cookie.value)
            .filter(|value| !value.is_empty())
    }

    fn set(&self, name: &str, value: &str, attributes: &CookieAttributes) {
        if let Ok(mut cookies) = self.cookies.lock() {
            cookies.insert(
                name.to_string(),
                StoredCookie {
                    value: value.to_string(),
                    attributes: attributes.clone(),
                },
            );
        }
    }

    fn remove(&self, name: &str, _attributes: &CookieAttributes) {
        if let Ok(mut cookies) = self.cookies.lock() {
            cookies.remove(name);
        }
    }
}
