pub mod bridge;
pub mod config;
pub mod errors;
pub mod host;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use bridge::{
    add_signalr, add_signalr_with_types, Assembly, BridgeBuilder, ContainerDependencyResolver,
    ContainerHubActivator, TypeDescriptor,
};
pub use config::BridgeConfig;
pub use errors::{BridgeError, ConfigError};
pub use host::{DependencyResolver, Hub, HubActivator, HubConfiguration, PersistentConnection};
pub use infrastructure::{ContainerError, ServiceContainer};
