//! Configuration management.
//!
//! Peerlink keeps a small TOML configuration under the platform config
//! directory:
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/peerlink/config.toml` |
//! | macOS | `~/Library/Application Support/Peerlink/config.toml` |
//! | Windows | `%APPDATA%\Peerlink\config.toml` |
//!
//! Every field has a serde default, so a missing or partial file falls back
//! cleanly.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{CHUNK_SIZE, HISTORY_CAP};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// History settings
    pub history: HistoryConfig,
    /// Transfer settings
    pub transfer: TransferConfig,
}

/// General configuration options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Fixed display name; when unset, the persisted or generated identity
    /// is used
    pub display_name: Option<String>,
}

/// History configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Whether messages are recorded at all
    pub enabled: bool,
    /// Maximum retained records
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: HISTORY_CAP,
        }
    }
}

/// Transfer configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Chunk size in bytes
    pub chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "peerlink", "Peerlink")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific path; a missing file yields defaults.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Save to a specific path, creating parent directories as needed.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("failed to create {}: {e}", parent.display())))?;
        }
        let raw = self.to_toml_string()?;
        fs::write(path, raw)
            .map_err(|e| Error::Config(format!("failed to write {}: {e}", path.display())))
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
