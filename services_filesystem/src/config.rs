//! Shim configuration
//!
//! Names the archives opened at init. Stored as versioned JSON so a host
//! build can point the shim at different save data without recompiling.

use core_types::{ArchiveId, ArchivePath, UserSaveDataLocator};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading or storing a configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(String),

    #[error("Failed to serialize config: {0}")]
    Serialization(String),

    #[error("Failed to deserialize config: {0}")]
    Deserialization(String),

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

/// Archives opened by [`FsContext::init`](crate::FsContext::init)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Version of the config format
    pub version: u32,
    /// Archive used as removable storage
    pub sdmc_archive: ArchiveId,
    /// Archive used as the private save area
    pub save_archive: ArchiveId,
    /// Save data to open when `save_archive` is `UserSaveData`
    pub save_data: UserSaveDataLocator,
}

impl FsConfig {
    /// Current version of the config format
    pub const CURRENT_VERSION: u32 = 1;

    /// Creates a config that opens the user save data named by `locator`
    pub fn new(save_data: UserSaveDataLocator) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            sdmc_archive: ArchiveId::Sdmc,
            save_archive: ArchiveId::UserSaveData,
            save_data,
        }
    }

    /// Returns the archive path used to open the save archive
    pub fn save_archive_path(&self) -> ArchivePath {
        match self.save_archive {
            ArchiveId::UserSaveData => self.save_data.to_archive_path(),
            _ => ArchivePath::Empty,
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: FsConfig = serde_json::from_slice(bytes)
            .map_err(|e| ConfigError::Deserialization(e.to_string()))?;

        if config.version != Self::CURRENT_VERSION {
            return Err(ConfigError::UnsupportedVersion(config.version));
        }

        Ok(config)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ConfigError> {
        serde_json::to_vec_pretty(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    /// Reads a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&bytes)
    }

    /// Writes a config file
    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let bytes = self.to_json()?;
        std::fs::write(path, bytes)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))
    }
}

impl Default for FsConfig {
    fn default() -> Self {
        Self::new(UserSaveDataLocator::default())
    }
}
