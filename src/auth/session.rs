//! Process-scoped key/value store for small session values.
//!
//! Values are stored as JSON so callers can keep typed preferences (the chat
//! color) next to plain strings (the auth token mirror). Nothing is written
//! to disk; the store dies with the process.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const CHAT_COLOR_KEY: &str = "chat_color";

#[derive(Debug, Default)]
pub struct SessionStore {
    values: Mutex<HashMap<String, Value>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and deserialize a stored value.
    ///
    /// A value that no longer deserializes into `T` is treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.lock().get(key).cloned()?;
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable session value");
                None
            }
        }
    }

    /// Serialize and store a value, replacing any previous one.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.lock().insert(key.to_owned(), json);
            }
            Err(e) => tracing::warn!(key, error = %e, "failed to store session value"),
        }
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
