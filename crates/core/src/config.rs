//! Application configuration.
//!
//! Settings are layered: built-in defaults, then the optional
//! `config.toml` under the user's config directory, then `GAMEDEX_*`
//! environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default catalog endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.rawg.io/api";
/// Namespace prefixed to every local storage key.
pub const DEFAULT_STORAGE_NAMESPACE: &str = "@GameDex";

const CONFIG_DIR: &str = "gamedex";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# GameDex configuration.
# Every value can also be set through GAMEDEX_<KEY> environment variables.

api_base_url = "https://api.rawg.io/api"
storage_namespace = "@GameDex"

# Catalog credential. Falls back to the key baked in at build time.
# api_key = ""

# Where favorites, onboarding state and logs are kept.
# data_dir = ""
"#;

/// Runtime configuration for the catalog client and local store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Base URL of the games catalog API, without trailing slash.
    pub api_base_url: String,
    /// Credential sent as the `key` query parameter on every request.
    pub api_key: String,
    /// Directory holding the storage file and logs.
    pub data_dir: PathBuf,
    /// Prefix for local storage keys.
    pub storage_namespace: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: option_env!("RAWG_API_KEY").unwrap_or_default().to_string(),
            data_dir: default_data_dir(),
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_file_path())
    }

    /// Load configuration using `path` as the (optional) config file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("api_key", defaults.api_key)?
            .set_default(
                "data_dir",
                defaults.data_dir.to_string_lossy().into_owned(),
            )?
            .set_default("storage_namespace", defaults.storage_namespace)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("GAMEDEX"))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        if config.data_dir.as_os_str().is_empty() {
            config.data_dir = default_data_dir();
        }
        Ok(config)
    }

    /// Path of the JSON file backing the local store.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.json")
    }

    /// Directory that receives log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// Location of the user's config file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write the default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_default_config_at(config_file_path())
}

/// Write the default config file at `path` unless it already exists.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(())
}
