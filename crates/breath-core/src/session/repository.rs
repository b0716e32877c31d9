//! Session repository trait.
//!
//! Defines the interface for preference and session-history persistence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::model::SessionRecord;
use crate::error::Result;
use crate::preferences::UserPreferences;

/// Read-only health snapshot of the session documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDiagnostics {
    /// Whether the primary document exists and parses as a list.
    pub primary_readable: bool,
    /// Entries in the primary document, valid or not.
    pub primary_count: usize,
    /// Size of the primary document in bytes.
    pub primary_bytes: usize,
    pub backup_readable: bool,
    pub backup_count: usize,
    pub backup_bytes: usize,
    /// Id of the newest entry in the primary document.
    pub latest_session_id: Option<String>,
}

/// An abstract repository for preferences and session history.
///
/// Decouples the session flow from the storage mechanism behind it.
///
/// # Caller obligations
///
/// `save_session` performs a read-modify-write on one shared document and the
/// underlying store offers no compare-and-swap. Two overlapping calls for
/// *different* ids can lose an update. Callers must serialize session writes,
/// which the save coordinator does for a single running session.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Loads preferences, falling back to defaults for anything missing or
    /// unreadable. Never fails.
    async fn get_preferences(&self) -> UserPreferences;

    /// Replaces the stored preferences.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Preferences written
    /// - `Err(_)`: Validation or storage failure; the caller decides what to show
    async fn save_preferences(&self, preferences: &UserPreferences) -> Result<()>;

    /// Lists sessions newest-first, repaired and filtered for display.
    ///
    /// Falls back to the backup document when the primary one cannot be read.
    async fn get_sessions(&self) -> Vec<SessionRecord>;

    /// Inserts or replaces a session and verifies the write by reading it back.
    ///
    /// # Returns
    ///
    /// `true` only when the record is confirmed present in storage. Invalid
    /// records, storage errors and failed verification all yield `false`.
    async fn save_session(&self, record: &SessionRecord) -> bool;

    /// Deletes the session history, backup included.
    async fn clear_sessions(&self) -> Result<()>;

    /// Restores the primary document from the backup and returns its
    /// display view. Empty when there is no usable backup.
    async fn recover_from_backup(&self) -> Vec<SessionRecord>;

    /// Health check without side effects.
    async fn get_diagnostics(&self) -> StorageDiagnostics;
}
