//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the token endpoint base address, the session backend, and
//! the last used username.
//!
//! Configuration is stored at `~/.config/authfront/config.json`. The base
//! address can be overridden with `AUTHFRONT_BASE_URL`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::DEFAULT_BASE_URL;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "authfront";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Overrides the configured base URL
pub const BASE_URL_ENV: &str = "AUTHFRONT_BASE_URL";

/// Pre-fills the username field
pub const USERNAME_ENV: &str = "AUTHFRONT_USERNAME";

/// Where the bearer token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    #[serde(default)]
    pub session_backend: SessionBackend,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit file; a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the config, falling back to defaults if it is missing or unreadable
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
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

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Per-user data directory holding the session file and logs
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(APP_NAME))
    }

    /// Effective token endpoint base address
    pub fn base_url(&self) -> String {
        resolve_base_url(std::env::var(BASE_URL_ENV).ok(), self.base_url.as_deref())
    }

    /// Username to pre-fill the login form with
    pub fn initial_username(&self) -> String {
        std::env::var(USERNAME_ENV)
            .ok()
            .filter(|u| !u.is_empty())
            .or_else(|| self.last_username.clone())
            .unwrap_or_default()
    }
}

/// Environment beats config file beats the built-in default. Empty values are ignored.
fn resolve_base_url(env: Option<String>, configured: Option<&str>) -> String {
    env.filter(|u| !u.is_empty())
        .or_else(|| configured.filter(|u| !u.is_empty()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}
