//! Container-backed hub activator

use crate::host::{Hub, HubActivator, HubDescriptor};
use crate::infrastructure::container::{ContainerError, ServiceContainer, WeakServiceContainer};
use std::sync::Arc;

/// Creates hubs by resolving the descriptor's exact type from the container.
///
/// The hub is handed to the host as-is; the host disposes it when the
/// invocation ends, never this activator.
pub struct ContainerHubActivator {
    container: WeakServiceContainer,
}

impl ContainerHubActivator {
    pub fn new(container: &ServiceContainer) -> Self {
        Self {
            container: container.downgrade(),
        }
    }
}

impl HubActivator for ContainerHubActivator {
    fn create(&self, descriptor: &HubDescriptor) -> Result<Arc<dyn Hub>, ContainerError> {
        let container = self
            .container
            .upgrade()
            .ok_or(ContainerError::ContainerDisposed)?;

        let instance = container.resolve_key(descriptor.hub_type)?;
        let hub = descriptor
            .as_hub(&instance)
            .ok_or_else(|| ContainerError::TypeCastFailed {
                expected: descriptor.hub_type.name(),
                actual: instance.service_key().name(),
            })?;

        tracing::trace!(hub = %descriptor.name, "Hub activated");
        Ok(hub)
    }
}
