use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use breath_core::config::AppConfig;
use breath_core::session::SessionRepository;
use breath_core::storage::{KeyValueStore, StorageKeys};
use breath_infrastructure::{BreathPaths, FileStore, KvSessionRepository, MemoryStore};

/// What every command works against.
pub struct AppContext {
    pub repository: Arc<dyn SessionRepository>,
    pub config: AppConfig,
    /// Human-readable description of where data lives.
    pub location: String,
}

/// Opens the store selected by the flags and config.
///
/// `--data-dir` wins over `data_dir` in the config file; `--ephemeral`
/// ignores both.
pub async fn open_context(
    data_dir: Option<PathBuf>,
    ephemeral: bool,
    config: AppConfig,
) -> Result<AppContext> {
    let (store, location): (Arc<dyn KeyValueStore>, String) = if ephemeral {
        (Arc::new(MemoryStore::new()), "memory (ephemeral)".to_string())
    } else {
        let paths = BreathPaths::new(data_dir.or_else(|| config.data_dir.clone()));
        let dir = paths.store_dir().context("Failed to resolve data directory")?;
        let store = FileStore::new(&dir)
            .await
            .with_context(|| format!("Failed to open store at {}", dir.display()))?;
        (Arc::new(store), dir.display().to_string())
    };

    tracing::debug!("[CLI] Using store: {}", location);
    let keys = StorageKeys::with_prefix(&config.key_prefix);
    let repository = Arc::new(KvSessionRepository::with_keys(store, keys));

    Ok(AppContext {
        repository,
        config,
        location,
    })
}
