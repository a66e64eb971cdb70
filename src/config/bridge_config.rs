use super::loader::{ConfigLoader, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
use super::registration_config::{PartialRegistrationSettings, RegistrationSettings};
use crate::errors::ConfigError;
use crate::logging::{init_logging, LogFormat, LoggingConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

/// Main bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    pub registration: RegistrationSettings,
    pub logging: LoggingSettings,
}

/// Partial bridge configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialBridgeConfig {
    registration: Option<PartialRegistrationSettings>,
    logging: Option<PartialLoggingSettings>,
}

/// Logging section as written in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingSettings {
    fn from_partial_and_env(
        partial: Option<PartialLoggingSettings>,
        env_map: &HashMap<String, String>,
    ) -> Self {
        let partial = partial.unwrap_or_default();

        Self {
            level: env_map
                .get(ENV_LOG_LEVEL)
                .cloned()
                .or(partial.level)
                .unwrap_or_else(default_log_level),
            format: env_map
                .get(ENV_LOG_FORMAT)
                .cloned()
                .or(partial.format)
                .unwrap_or_else(default_log_format),
        }
    }

    /// Turn the textual settings into a subscriber configuration
    pub fn to_logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        let level = Level::from_str(self.level.trim()).map_err(|_| ConfigError::InvalidValue {
            field: "logging.level".to_string(),
            value: self.level.clone(),
        })?;
        let format = match self.format.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            "json" => LogFormat::Json,
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "logging.format".to_string(),
                    value: self.format.clone(),
                })
            }
        };

        Ok(LoggingConfig::new(level, format))
    }

    /// Install the global subscriber described by these settings
    pub fn init(&self) -> Result<(), ConfigError> {
        init_logging(self.to_logging_config()?).map_err(|e| ConfigError::Logging(e.to_string()))
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file, applying environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::new().load(path.as_ref())
    }

    /// Parse configuration from TOML text without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let partial = toml::from_str::<PartialBridgeConfig>(content)
            .map_err(|e| ConfigError::TomlParse("<inline>".to_string(), e))?;
        Self::from_partial_and_env(Some(partial), HashMap::new())
    }

    /// Create BridgeConfig from partial config and environment
    pub fn from_partial_and_env(
        partial: Option<PartialBridgeConfig>,
        env_map: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();

        let config = BridgeConfig {
            registration: RegistrationSettings::from_partial(partial.registration),
            logging: LoggingSettings::from_partial_and_env(partial.logging, &env_map),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.to_logging_config().map(|_| ())
    }
}

// Default functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
