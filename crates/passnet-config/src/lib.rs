use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PASSNET_DIR_NAME: &str = ".passnet";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const GRAPH_DB_FILE_NAME: &str = "graph.sqlite";
pub const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PassnetConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Upper bound on how long a substrate operation waits for a busy
    /// database before failing. Zero is normalized back to the default.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub fn passnet_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(PASSNET_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    passnet_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn graph_db_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    passnet_dir(workspace_root).join(GRAPH_DB_FILE_NAME)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<PassnetConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(PassnetConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PassnetConfig = toml::from_str(&raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<PassnetConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(passnet_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = PassnetConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

fn normalize_config(mut config: PassnetConfig) -> PassnetConfig {
    if config.store.busy_timeout_ms == 0 {
        config.store.busy_timeout_ms = default_busy_timeout_ms();
    }

    config
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn ensure_workspace_config_creates_default_file() {
        let temp = tempdir().expect("tempdir");
        let workspace = temp.path();

        let config = ensure_workspace_config(workspace).expect("ensure config");

        assert_eq!(config.store.busy_timeout_ms, DEFAULT_STORE_BUSY_TIMEOUT_MS);
        assert!(config_path(workspace).exists());

        let content = fs::read_to_string(config_path(workspace)).expect("read config file");
        assert!(content.contains("[store]"));
        assert!(content.contains("busy_timeout_ms = 5000"));
    }

    #[test]
    fn load_workspace_config_parses_and_normalizes_store_values() {
        let temp = tempdir().expect("tempdir");
        let workspace = temp.path();
        fs::create_dir_all(passnet_dir(workspace)).expect("create .passnet");

        fs::write(config_path(workspace), "[store]\nbusy_timeout_ms = 250\n")
            .expect("write config");
        let config = load_workspace_config(workspace).expect("load config");
        assert_eq!(config.store.busy_timeout_ms, 250);

        fs::write(config_path(workspace), "[store]\nbusy_timeout_ms = 0\n")
            .expect("rewrite config");
        let config = load_workspace_config(workspace).expect("reload config");
        assert_eq!(config.store.busy_timeout_ms, DEFAULT_STORE_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn load_workspace_config_defaults_when_file_is_absent() {
        let temp = tempdir().expect("tempdir");

        let config = load_workspace_config(temp.path()).expect("load config");
        assert_eq!(config, PassnetConfig::default());
    }
}
