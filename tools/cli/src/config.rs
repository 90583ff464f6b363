//! Application configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use peoplesync_sync::SyncConfig;

const APP_DIR: &str = "peoplesync";

/// Which remote directory to sync with, and its backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Registry name of the directory backend (`file`, `memory`).
    pub provider: String,
    #[serde(default)]
    pub config: Value,
}

/// Settings read from `config.json`. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub contacts_file: PathBuf,
    pub links_file: PathBuf,
    pub credentials_file: PathBuf,
    pub directory: DirectoryConfig,
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            contacts_file: data_dir.join("contacts.json"),
            links_file: data_dir.join("links.json"),
            credentials_file: data_dir.join("credentials.json"),
            directory: DirectoryConfig {
                provider: "file".to_string(),
                config: json!({ "path": data_dir.join("people.json") }),
            },
            sync: SyncConfig::default(),
        }
    }

    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present and the defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::with_data_dir(&data_dir)
    }
}

/// `<config dir>/peoplesync/config.json`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
}
