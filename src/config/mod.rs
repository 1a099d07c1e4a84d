//! Client configuration.
//!
//! Resolution order: built-in defaults, then `config.toml` in the
//! project config directory, then environment overrides. Unknown keys in
//! the file are warned about and ignored so an old binary tolerates a
//! newer file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Dev backend the original deployment runs against.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "QUILLGATE_API_URL";
const ENV_DATA_DIR: &str = "QUILLGATE_DATA_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend REST service.
    pub api_base_url: String,
    /// Whole-request timeout for gateway calls, in seconds.
    pub timeout_secs: u64,
    /// Directory holding the local store. `~` is expanded. Defaults to
    /// the platform data directory.
    pub data_dir: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Location of the config file, platform dependent.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "quillgate", "quillgate")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location, tolerating an
    /// absent or unreadable file.
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::from_file(&path) {
                Ok(config) => Some(config),
                Err(err) => {
                    tracing::warn!("ignoring config {}: {err}", path.display());
                    None
                }
            })
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Parse a TOML config file, warning about unknown keys instead of
    /// failing on them.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let value: toml::Value = toml::from_str(&raw)?;

        let mut unknown = Vec::new();
        let config: Self = serde_ignored::deserialize(value, |key| {
            unknown.push(key.to_string());
        })?;
        for key in unknown {
            tracing::warn!("unknown config key: {key}");
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.is_empty() {
                self.api_base_url = url;
            }
        }
        if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
            if !dir.is_empty() {
                self.data_dir = Some(dir);
            }
        }
    }

    /// Resolve the on-disk store path, creating the directory if needed.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
            None => directories::ProjectDirs::from("dev", "quillgate", "quillgate")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| anyhow::anyhow!("no usable data directory on this platform"))?,
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join("quillgate.db"))
    }
}
