mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, io::ErrorKind};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Loads the configuration from `$CONFIG_PATH` (or `config.yaml`) and applies
/// environment overrides.
pub async fn load() -> Result<Config> {
    let explicit_path = env::var("CONFIG_PATH").ok();
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = load_from_path(&config_path, explicit_path.is_some()).await?;

    Ok(apply_env_overrides(config, env::var(API_KEY_VAR).ok()))
}

/// Reads a YAML configuration file. A missing file falls back to defaults
/// unless `required` is set.
pub async fn load_from_path(config_path: &str, required: bool) -> Result<Config> {
    debug!("Loading configuration from: {}", config_path);

    match tokio::fs::read_to_string(config_path).await {
        Ok(config_str) => parse(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound && !required => {
            debug!(
                "Configuration file {} not found, using defaults",
                config_path
            );
            Ok(Config::default())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::config(format!(
            "Configuration file not found: {}",
            config_path
        ))),
        Err(e) => Err(e.into()),
    }
}

pub fn parse(config_str: &str) -> Result<Config> {
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

/// The API key from the environment wins over the file.
pub fn apply_env_overrides(mut config: Config, api_key: Option<String>) -> Config {
    if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
        config.llm.api_key = key;
    }
    config
}
