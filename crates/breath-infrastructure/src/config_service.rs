//! Configuration service implementation.
//!
//! Loads `AppConfig` from `config.toml`. A missing file means defaults.

use std::path::{Path, PathBuf};

use breath_core::config::AppConfig;
use breath_core::error::{BreathError, Result};

use crate::paths::BreathPaths;

/// Loads the application configuration from a TOML file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the platform config location.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(BreathPaths::config_file()?))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the file.
    ///
    /// # Returns
    ///
    /// - `Ok(config)`: Parsed config, or defaults when the file does not exist
    /// - `Err(_)`: The file exists but cannot be read or parsed
    pub async fn load(&self) -> Result<AppConfig> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    "[ConfigService] No config at {}, using defaults",
                    self.path.display()
                );
                return Ok(AppConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            BreathError::config(format!("Invalid {}: {}", self.path.display(), e))
        })
    }
}
