//! Application configuration management.
//!
//! Holds the API base URL, request timeout, which durable backend keeps
//! remembered tokens, and the last used username.
//!
//! Configuration is stored at `~/.config/authgate/config.json`. The
//! `AUTHGATE_API_URL` and `AUTHGATE_TIMEOUT_SECS` environment variables
//! override the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{FileStorage, KeyringStorage, MemoryStorage, StorageBackend, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "authgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Durable token storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Auth calls are small; 10s fails fast enough to keep the login form responsive.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const API_URL_ENV: &str = "AUTHGATE_API_URL";
pub const TIMEOUT_ENV: &str = "AUTHGATE_TIMEOUT_SECS";

/// Where remember-me tokens are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurableBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub durable_backend: DurableBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            durable_backend: DurableBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid {}", TIMEOUT_ENV),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Token store with the configured durable backend and an in-process
    /// ephemeral one.
    pub fn token_store(&self) -> Result<TokenStore> {
        let durable: Arc<dyn StorageBackend> = match self.durable_backend {
            DurableBackend::File => Arc::new(FileStorage::new(self.data_dir()?.join(STORAGE_FILE))),
            DurableBackend::Keyring => Arc::new(KeyringStorage::new(APP_NAME)),
        };
        Ok(TokenStore::new(durable, Arc::new(MemoryStorage::new())))
    }
}
