use crate::bridge::ComponentKind;
use serde::Deserialize;

/// Which registration passes the bridge runs
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSettings {
    /// Register hub implementations
    #[serde(default = "default_enabled")]
    pub hubs: bool,

    /// Register persistent connection implementations
    #[serde(default = "default_enabled")]
    pub persistent_connections: bool,
}

/// Partial Registration Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialRegistrationSettings {
    pub hubs: Option<bool>,
    pub persistent_connections: Option<bool>,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            hubs: default_enabled(),
            persistent_connections: default_enabled(),
        }
    }
}

impl RegistrationSettings {
    /// Create RegistrationSettings from partial config with defaults
    pub fn from_partial(partial: Option<PartialRegistrationSettings>) -> Self {
        let partial = partial.unwrap_or_default();

        Self {
            hubs: partial.hubs.unwrap_or_else(default_enabled),
            persistent_connections: partial
                .persistent_connections
                .unwrap_or_else(default_enabled),
        }
    }

    /// Component kinds to register, in pass order
    pub fn kinds(&self) -> Vec<ComponentKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.hubs {
            kinds.push(ComponentKind::Hub);
        }
        if self.persistent_connections {
            kinds.push(ComponentKind::PersistentConnection);
        }
        kinds
    }
}

fn default_enabled() -> bool {
    true
}
