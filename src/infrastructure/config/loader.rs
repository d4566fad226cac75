use crate::foundation::{CoordinatorError, Result};
use crate::infrastructure::config::types::{CoordinatorConfig, NetworkKind};
use log::info;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_PATH_ENV: &str = "COVAULT_CONFIG_PATH";
pub const PROJECT_ID_ENV: &str = "COVAULT_PROJECT_ID";
pub const NETWORK_ENV: &str = "COVAULT_NETWORK";
pub const DEST_ADDRESS_ENV: &str = "COVAULT_DEST_ADDRESS";

const DEFAULT_CONFIG_FILE: &str = "covault.toml";

pub fn resolve_config_path() -> PathBuf {
    if let Ok(value) = std::env::var(CONFIG_PATH_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

pub fn load_from_path(path: &Path) -> Result<CoordinatorConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| CoordinatorError::ConfigError(format!("cannot read {}: {err}", path.display())))?;
    let mut config: CoordinatorConfig = toml::from_str(&raw)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    info!("configuration loaded path={} network={}", path.display(), config.network);
    Ok(config)
}

pub fn load() -> Result<CoordinatorConfig> {
    load_from_path(&resolve_config_path())
}

/// Secrets and deployment knobs may arrive via the environment; they win
/// over the file.
pub fn apply_env_overrides(config: &mut CoordinatorConfig) -> Result<()> {
    if let Some(value) = non_empty_env(PROJECT_ID_ENV) {
        config.indexer_project_id = value;
    }
    if let Some(value) = non_empty_env(NETWORK_ENV) {
        config.network = NetworkKind::from_str(&value)?;
    }
    if let Some(value) = non_empty_env(DEST_ADDRESS_ENV) {
        config.dest_address = Some(value);
    }
    Ok(())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
