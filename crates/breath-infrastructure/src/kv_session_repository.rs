//! Key-value backed SessionRepository implementation.
//!
//! Documents:
//! ```text
//! {prefix}preferences      UserPreferences as JSON
//! {prefix}sessions         JSON array of SessionRecord, newest first
//! {prefix}sessions_backup  mirror of sessions, written after a verified save
//! ```
//!
//! The store has no transactions, so a session save is a read-raw / write /
//! read-back sequence. The raw read keeps every stored entry, including ones
//! the display view would hide, so a save never drops older data.

use std::sync::Arc;

use async_trait::async_trait;
use breath_core::error::{BreathError, Result};
use breath_core::preferences::UserPreferences;
use breath_core::session::{SessionRecord, SessionRepository, StorageDiagnostics};
use breath_core::storage::{KeyValueStore, StorageKeys};
use serde_json::Value;

/// Session repository over any `KeyValueStore`.
pub struct KvSessionRepository {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
}

impl KvSessionRepository {
    /// Creates a repository using the default key names.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_keys(store, StorageKeys::default())
    }

    pub fn with_keys(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Reads a session list document without any filtering.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(entries))`: The document parsed as a JSON array
    /// - `Ok(None)`: The key is absent
    /// - `Err(_)`: The read failed or the content is not a JSON array
    async fn read_raw(&self, key: &str) -> Result<Option<Vec<Value>>> {
        let Some(content) = self.store.get(key).await? else {
            return Ok(None);
        };
        let entries: Vec<Value> = serde_json::from_str(&content)?;
        Ok(Some(entries))
    }

    /// The list a save starts from: the primary document, or the backup
    /// when the primary is absent or unreadable.
    async fn load_write_base(&self) -> Vec<Value> {
        match self.read_raw(&self.keys.sessions).await {
            Ok(Some(entries)) => return entries,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    "[SessionRepository] Primary session list unreadable before write: {}",
                    e
                );
            }
        }

        match self.read_raw(&self.keys.sessions_backup).await {
            Ok(Some(entries)) => {
                tracing::info!(
                    "[SessionRepository] Building write on backup ({} entries)",
                    entries.len()
                );
                entries
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("[SessionRepository] Backup unreadable before write: {}", e);
                Vec::new()
            }
        }
    }

    /// Upserts `record` into the primary list and confirms it by reading the
    /// list back. Returns the serialized list that was written.
    async fn write_verified(&self, record: &SessionRecord) -> Result<String> {
        let mut entries = self.load_write_base().await;
        let value = serde_json::to_value(record)?;

        match entries
            .iter()
            .position(|entry| entry_id(entry) == Some(record.id.as_str()))
        {
            Some(index) => entries[index] = value,
            None => entries.insert(0, value),
        }

        let serialized = serde_json::to_string(&entries)?;
        self.store.set(&self.keys.sessions, &serialized).await?;

        let persisted = self
            .read_raw(&self.keys.sessions)
            .await?
            .unwrap_or_default();
        if !persisted
            .iter()
            .any(|entry| entry_id(entry) == Some(record.id.as_str()))
        {
            return Err(BreathError::storage(format!(
                "session '{}' missing from read-back after write",
                record.id
            )));
        }

        Ok(serialized)
    }

    async fn mirror_to_backup(&self, serialized: &str) {
        if let Err(e) = self.store.set(&self.keys.sessions_backup, serialized).await {
            tracing::warn!("[SessionRepository] Backup write failed: {}", e);
        }
    }

    /// Entry count and byte size of one document, for diagnostics.
    async fn inspect(&self, key: &str) -> (bool, usize, usize, Option<String>) {
        match self.store.get(key).await {
            Ok(Some(content)) => match serde_json::from_str::<Vec<Value>>(&content) {
                Ok(entries) => {
                    let latest = entries.first().and_then(entry_id).map(str::to_string);
                    (true, entries.len(), content.len(), latest)
                }
                Err(_) => (false, 0, content.len(), None),
            },
            Ok(None) | Err(_) => (false, 0, 0, None),
        }
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

/// Parses raw entries and applies the display rules: unparseable entries
/// and entries without holds are hidden, `completedRounds` is repaired.
fn display_view(entries: Vec<Value>) -> Vec<SessionRecord> {
    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<SessionRecord>(entry).ok())
        .filter_map(SessionRecord::normalized)
        .collect()
}

#[async_trait]
impl SessionRepository for KvSessionRepository {
    async fn get_preferences(&self) -> UserPreferences {
        let content = match self.store.get(&self.keys.preferences).await {
            Ok(Some(content)) => content,
            Ok(None) => return UserPreferences::default(),
            Err(e) => {
                tracing::warn!("[SessionRepository] Failed to load preferences: {}", e);
                return UserPreferences::default();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(stored) => UserPreferences::merged_over_defaults(&stored),
            Err(e) => {
                tracing::warn!("[SessionRepository] Stored preferences are corrupt: {}", e);
                UserPreferences::default()
            }
        }
    }

    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        preferences.validate()?;
        let serialized = serde_json::to_string(preferences)?;
        self.store
            .set(&self.keys.preferences, &serialized)
            .await
            .inspect_err(|e| {
                tracing::error!("[SessionRepository] Failed to save preferences: {}", e)
            })
    }

    async fn get_sessions(&self) -> Vec<SessionRecord> {
        match self.read_raw(&self.keys.sessions).await {
            Ok(Some(entries)) => display_view(entries),
            Ok(None) => self.recover_from_backup().await,
            Err(e) => {
                tracing::warn!("[SessionRepository] Failed to load sessions: {}", e);
                self.recover_from_backup().await
            }
        }
    }

    async fn save_session(&self, record: &SessionRecord) -> bool {
        if !record.is_persistable() {
            tracing::warn!(
                "[SessionRepository] Refusing to save invalid session '{}' ({} holds)",
                record.id,
                record.hold_times.len()
            );
            return false;
        }

        match self.write_verified(record).await {
            Ok(serialized) => {
                self.mirror_to_backup(&serialized).await;
                tracing::info!(
                    "[SessionRepository] Session saved and verified: {}",
                    record.id
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    "[SessionRepository] Failed to save session {}: {}",
                    record.id,
                    e
                );
                false
            }
        }
    }

    async fn clear_sessions(&self) -> Result<()> {
        let primary = self.store.remove(&self.keys.sessions).await;
        let backup = self.store.remove(&self.keys.sessions_backup).await;
        primary.and(backup).inspect_err(|e| {
            tracing::error!("[SessionRepository] Failed to clear sessions: {}", e)
        })
    }

    async fn recover_from_backup(&self) -> Vec<SessionRecord> {
        let entries = match self.read_raw(&self.keys.sessions_backup).await {
            Ok(Some(entries)) => entries,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("[SessionRepository] Backup unreadable: {}", e);
                return Vec::new();
            }
        };

        match serde_json::to_string(&entries) {
            Ok(serialized) => match self.store.set(&self.keys.sessions, &serialized).await {
                Ok(()) => tracing::info!(
                    "[SessionRepository] Restored {} entries from backup",
                    entries.len()
                ),
                Err(e) => tracing::warn!(
                    "[SessionRepository] Could not restore primary from backup: {}",
                    e
                ),
            },
            Err(e) => tracing::warn!("[SessionRepository] Could not re-encode backup: {}", e),
        }

        display_view(entries)
    }

    async fn get_diagnostics(&self) -> StorageDiagnostics {
        let (primary_readable, primary_count, primary_bytes, latest_session_id) =
            self.inspect(&self.keys.sessions).await;
        let (backup_readable, backup_count, backup_bytes, _) =
            self.inspect(&self.keys.sessions_backup).await;

        StorageDiagnostics {
            primary_readable,
            primary_count,
            primary_bytes,
            backup_readable,
            backup_count,
            backup_bytes,
            latest_session_id,
        }
    }
}
