//! In-memory key-value store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use breath_core::error::{BreathError, Result};
use breath_core::storage::KeyValueStore;
use tokio::sync::RwLock;

/// A `KeyValueStore` kept in a map.
///
/// Used for ephemeral runs and tests. Keys can be made to fail on purpose so
/// the repository's degraded paths can be exercised.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    failing_reads: RwLock<HashSet<String>>,
    failing_writes: RwLock<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `get` of `key` fail until cleared.
    pub async fn fail_reads(&self, key: &str, failing: bool) {
        let mut keys = self.failing_reads.write().await;
        if failing {
            keys.insert(key.to_string());
        } else {
            keys.remove(key);
        }
    }

    /// Makes every `set` of `key` fail until cleared.
    pub async fn fail_writes(&self, key: &str, failing: bool) {
        let mut keys = self.failing_writes.write().await;
        if failing {
            keys.insert(key.to_string());
        } else {
            keys.remove(key);
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.failing_reads.read().await.contains(key) {
            return Err(BreathError::storage(format!("read of '{}' failed", key)));
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.failing_writes.read().await.contains(key) {
            return Err(BreathError::storage(format!("write of '{}' failed", key)));
        }
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();

        store.fail_reads("k", true).await;
        assert!(store.get("k").await.is_err());
        store.fail_reads("k", false).await;
        assert!(store.get("k").await.is_ok());

        store.fail_writes("k", true).await;
        assert!(store.set("k", "w").await.unwrap_err().is_storage());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
