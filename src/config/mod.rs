pub mod bridge_config;
pub mod loader;
pub mod registration_config;

// Re-export commonly used types
pub use bridge_config::{BridgeConfig, LoggingSettings, PartialBridgeConfig};
pub use loader::{ConfigLoader, ENV_LOG_FORMAT, ENV_LOG_LEVEL};
pub use registration_config::RegistrationSettings;
