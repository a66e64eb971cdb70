use crate::infrastructure::container::ContainerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Required argument '{0}' is missing")]
    MissingArgument(&'static str),
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for '{field}'")]
    InvalidValue { field: String, value: String },
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
