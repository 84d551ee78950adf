//! Configuration
//!
//! Tuning knobs only. Nothing here changes the bytes an engine produces.
//!
//! Lookup order for [`HoloConfig::load`]:
//! 1. `$CONFIG_DIR/holohash/config.yaml` if it exists, else defaults
//! 2. `HOLOHASH_CHUNK_SIZE` / `HOLOHASH_KEYCHAIN_CAPACITY` overrides

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform;
use crate::{Error, Result};

pub const ENV_CHUNK_SIZE: &str = "HOLOHASH_CHUNK_SIZE";
pub const ENV_KEYCHAIN_CAPACITY: &str = "HOLOHASH_KEYCHAIN_CAPACITY";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoloConfig {
    pub platform: PlatformConfig,
    pub keychain: KeychainConfig,
}

/// Batch sizes for the mixing loops
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub chunk_size: usize,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            chunk_size: platform::cache_granularity(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeychainConfig {
    /// Records to reserve space for up front
    pub initial_capacity: usize,
}

impl HoloConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("holohash").join("config.yaml"))
    }

    /// Load from the default path (if present) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_path(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON or YAML file, chosen by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&raw)
                .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?,
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)
                .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?,
            _ => {
                return Err(Error::ConfigError(format!(
                    "Unsupported config format: {}",
                    path.display()
                )))
            }
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded holohash config");
        Ok(config)
    }

    /// Apply overrides from `lookup`; unparsable values are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CHUNK_SIZE) {
            match raw.trim().parse() {
                Ok(value) => self.platform.chunk_size = value,
                Err(_) => tracing::warn!(
                    var = ENV_CHUNK_SIZE,
                    value = %raw,
                    "ignoring invalid override"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_KEYCHAIN_CAPACITY) {
            match raw.trim().parse() {
                Ok(value) => self.keychain.initial_capacity = value,
                Err(_) => tracing::warn!(
                    var = ENV_KEYCHAIN_CAPACITY,
                    value = %raw,
                    "ignoring invalid override"
                ),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.platform.chunk_size == 0 {
            return Err(Error::ConfigError("platform.chunk_size must be at least 1".into()));
        }
        Ok(())
    }
}
