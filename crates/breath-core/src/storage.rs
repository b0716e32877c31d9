//! Key-value store seam.
//!
//! The session documents live in a plain string key-value store. Each call is
//! atomic on its own; there are no multi-key transactions and no retries.

use async_trait::async_trait;

use crate::error::Result;

/// Atomic get/set/remove on string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

pub const DEFAULT_KEY_PREFIX: &str = "@breathingapp:";

/// Names of the documents kept in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub preferences: String,
    pub sessions: String,
    pub sessions_backup: String,
    /// Read by UI collaborators only.
    pub theme_preference: String,
    /// Read by UI collaborators only.
    pub safety_warning_seen: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            preferences: format!("{prefix}preferences"),
            sessions: format!("{prefix}sessions"),
            sessions_backup: format!("{prefix}sessions_backup"),
            theme_preference: format!("{prefix}theme_preference"),
            safety_warning_seen: format!("{prefix}safety_warning_seen"),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }
}
