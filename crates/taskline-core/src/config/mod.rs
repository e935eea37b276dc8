//! Sync settings shared by every front end.
//!
//! Settings live in `<config_dir>/taskline/config.json`. Environment
//! variables take precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

const CONFIG_DIR_NAME: &str = "taskline";
const CONFIG_FILE_NAME: &str = "config.json";
const DATABASE_FILE_NAME: &str = "tasks.db";

pub const REMOTE_URL_ENV: &str = "TASKLINE_REMOTE_URL";
pub const DB_PATH_ENV: &str = "TASKLINE_DB_PATH";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PROBE_INTERVAL_SECS: u64 = 15;
const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSettings {
    /// Base URL of the remote task authority
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

const fn default_probe_interval_secs() -> u64 {
    DEFAULT_PROBE_INTERVAL_SECS
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
        }
    }
}

/// `<config_dir>/taskline/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// `<data_dir>/taskline/tasks.db`, if the platform has a data dir.
pub fn default_db_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(DATABASE_FILE_NAME))
}

/// Pick the database location: explicit path, then `TASKLINE_DB_PATH`, then
/// the platform default.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit
        .or_else(|| normalize_text_option(std::env::var(DB_PATH_ENV).ok()).map(PathBuf::from))
        .or_else(default_db_path)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "could not determine a database location; pass --db-path or set {DB_PATH_ENV}"
            ))
        })
}

impl SyncSettings {
    /// Load from the default path and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match default_config_path() {
            Some(path) => Self::load_from_path(&path)?,
            None => Self::default(),
        };
        settings.apply_remote_override(std::env::var(REMOTE_URL_ENV).ok());
        Ok(settings)
    }

    /// A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut settings = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::InvalidInput(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        settings.normalize();
        Ok(settings)
    }

    /// Save to the default path and return where it went.
    pub fn save(&self) -> Result<PathBuf> {
        let path = default_config_path().ok_or_else(|| {
            Error::InvalidInput("could not determine a config directory".to_string())
        })?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Replace the remote URL with `value` when it is non-blank.
    pub fn apply_remote_override(&mut self, value: Option<String>) {
        if let Some(url) = normalize_text_option(value) {
            tracing::debug!("Using remote URL from {REMOTE_URL_ENV}");
            self.remote_url = Some(url);
        }
    }

    /// Validate and store a new remote URL.
    pub fn set_remote_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if !is_http_url(url) {
            return Err(Error::InvalidInput(
                "remote URL must include http:// or https://".to_string(),
            ));
        }
        self.remote_url = Some(url.trim_end_matches('/').to_string());
        Ok(())
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    /// Per-request timeout, never shorter than 100ms
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(MIN_REQUEST_TIMEOUT_MS))
    }

    /// Probe interval, never shorter than one second
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }

    fn normalize(&mut self) {
        self.remote_url = normalize_text_option(self.remote_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
    }
}
