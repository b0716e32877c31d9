//! Application configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every field has a
//! default, so a missing or partial file is fine.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_KEY_PREFIX;

/// Default timeout for waiting on an in-flight session save.
pub const DEFAULT_SAVE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Prefix for every storage key.
    pub key_prefix: String,
    /// How long leaving a finished session waits for its save.
    pub save_timeout_secs: u64,
    /// Default tracing filter when no env filter is set.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            save_timeout_secs: DEFAULT_SAVE_TIMEOUT_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn save_timeout(&self) -> Duration {
        Duration::from_secs(self.save_timeout_secs)
    }
}
