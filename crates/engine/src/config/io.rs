//! Configuration IO helpers.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use dirs_next::config_dir;
use quay_util::expand_tilde;
use tracing::debug;

use super::QuayConfig;
use crate::error::ConfigurationError;

/// Environment variable allowing callers to override the configuration file path.
pub const CONFIG_PATH_ENV: &str = "QUAY_CONFIG_PATH";

/// Returns the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("quay").join("config.json")
}

/// Loads configuration from the default path.
pub fn load_config() -> Result<QuayConfig, ConfigurationError> {
    load_config_from_path(&default_config_path())
}

/// Loads configuration from `path`; a missing file yields the defaults.
pub fn load_config_from_path(path: &Path) -> Result<QuayConfig, ConfigurationError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "configuration file not found; using defaults");
            return Ok(QuayConfig::default());
        }
        Err(source) => {
            return Err(ConfigurationError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&content).map_err(|source| ConfigurationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
