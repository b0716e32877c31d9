//! Directory-backed key-value store with atomic per-key writes.
//!
//! Directory structure:
//! ```text
//! base_dir/
//! ├── %40breathingapp%3Apreferences.value
//! ├── %40breathingapp%3Asessions.value
//! └── %40breathingapp%3Asessions_backup.value
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use breath_core::error::{BreathError, Result};
use breath_core::storage::KeyValueStore;
use tokio::fs;
use tokio::io::AsyncWriteExt;

const VALUE_EXTENSION: &str = "value";

/// One file per key.
///
/// Provides:
/// - **Atomicity**: `set` writes a temp file and renames it over the target
/// - **Durability**: the temp file is fsynced before the rename
///
/// There is no locking and no multi-key transaction.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `base_dir`, creating the directory if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", encode_key(key), VALUE_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!(".{}.tmp", encode_key(key)))
    }

    async fn replace(&self, key: &str, tmp_path: &Path, value: &str) -> Result<()> {
        let mut tmp_file = fs::File::create(tmp_path).await?;
        tmp_file.write_all(value.as_bytes()).await?;
        tmp_file.sync_all().await?;
        drop(tmp_file);

        fs::rename(tmp_path, self.value_path(key))
            .await
            .map_err(|e| BreathError::io(format!("Failed to replace '{}': {}", key, e)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.value_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let tmp_path = self.temp_path(key);

        let result = self.replace(key, &tmp_path, value).await;
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path).await;
        }
        result
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Maps a key to a portable file name: ASCII alphanumerics, `-` and `_`
/// pass through, every other byte becomes `%XX`.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("@breathingapp:sessions"), "%40breathingapp%3Asessions");
        assert_eq!(encode_key("plain_key-1"), "plain_key-1");
        assert_eq!(encode_key("../x"), "%2E%2E%2Fx");
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).await.unwrap();

        store.set("@app:sessions", "[1,2]").await.unwrap();
        assert_eq!(
            store.get("@app:sessions").await.unwrap().as_deref(),
            Some("[1,2]")
        );

        store.set("@app:sessions", "[]").await.unwrap();
        assert_eq!(store.get("@app:sessions").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).await.unwrap();

        assert_eq!(store.get("nope").await.unwrap(), None);
        store.remove("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_and_no_temp_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested")).await.unwrap();

        store.set("k", "v").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        let mut entries = fs::read_dir(store.base_dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_replace_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path()).await.unwrap();

        // A directory in the value's place makes the rename fail.
        let blocker = store.value_path("k");
        fs::create_dir(&blocker).await.unwrap();
        fs::write(blocker.join("inner"), "x").await.unwrap();

        assert!(store.set("k", "v").await.is_err());
        assert!(!store.temp_path("k").exists());
        assert!(blocker.is_dir());
    }
}
