use super::bridge_config::{BridgeConfig, PartialBridgeConfig};
use crate::errors::ConfigError;
use std::{collections::HashMap, env, fs, path::Path};

/// Environment variable overriding `logging.level`
pub const ENV_LOG_LEVEL: &str = "HUB_BRIDGE_LOG_LEVEL";
/// Environment variable overriding `logging.format`
pub const ENV_LOG_FORMAT: &str = "HUB_BRIDGE_LOG_FORMAT";

const ENV_KEYS: [&str; 2] = [ENV_LOG_LEVEL, ENV_LOG_FORMAT];

/// Configuration loader responsible for loading config from files and environment
#[derive(Debug, Default)]
pub struct ConfigLoader {
    env_override: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a new config loader reading the process environment
    pub fn new() -> Self {
        Self { env_override: None }
    }

    /// Create a config loader with a fixed environment (for testing)
    pub fn with_env(env_map: HashMap<String, String>) -> Self {
        Self {
            env_override: Some(env_map),
        }
    }

    /// Load configuration from `path`; a missing file yields the defaults
    pub fn load(&self, path: &Path) -> Result<BridgeConfig, ConfigError> {
        let partial = self.load_partial_config(path)?;
        let env_map = self.collect_env_vars();
        BridgeConfig::from_partial_and_env(partial, env_map)
    }

    fn load_partial_config(&self, path: &Path) -> Result<Option<PartialBridgeConfig>, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e))?;
        let partial = toml::from_str(&content)
            .map_err(|e| ConfigError::TomlParse(path.display().to_string(), e))?;
        Ok(Some(partial))
    }

    /// Collect environment overrides
    fn collect_env_vars(&self) -> HashMap<String, String> {
        if let Some(env_map) = &self.env_override {
            return env_map.clone();
        }

        ENV_KEYS
            .iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect()
    }
}
