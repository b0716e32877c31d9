//! Unified path management for breath configuration and data.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/breath/            # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/breath/       # Data directory
//! └── store/                   # FileStore documents
//! ```

use std::path::PathBuf;

use breath_core::error::{BreathError, Result};

const APP_DIR: &str = "breath";
const CONFIG_FILE: &str = "config.toml";
const STORE_DIR: &str = "store";

/// Resolves platform paths, honouring an explicit data directory override.
#[derive(Debug, Clone, Default)]
pub struct BreathPaths {
    data_dir_override: Option<PathBuf>,
}

impl BreathPaths {
    pub fn new(data_dir_override: Option<PathBuf>) -> Self {
        Self { data_dir_override }
    }

    /// Returns the configuration directory (`<platform config>/breath`).
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| BreathError::config("Cannot find config directory"))
    }

    /// Returns the path of `config.toml`.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Returns the data directory: the override if set, otherwise
    /// `<platform data>/breath`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir_override {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| BreathError::config("Cannot find data directory"))
    }

    /// Returns the directory holding the key-value documents.
    pub fn store_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(STORE_DIR))
    }
}
