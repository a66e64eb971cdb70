//! Component contracts recognized by the hub host

use super::short_type_name;
use crate::infrastructure::container::{ContainerError, Disposable, Instance, ServiceKey};
use downcast_rs::{impl_downcast, DowncastSync};
use std::fmt;
use std::sync::Arc;

/// Base behaviour shared by every hub.
///
/// A hub lives for a single invocation; the host calls [`Disposable::dispose`] on it
/// when the invocation completes.
pub trait Hub: DowncastSync + Disposable {
    fn on_connected(&self, _connection_id: &str) {}

    fn on_reconnected(&self, _connection_id: &str) {}

    fn on_disconnected(&self, _connection_id: &str, _stop_called: bool) {}
}
impl_downcast!(sync Hub);

/// Marker contract implemented by every [`Hub`].
pub trait HubContract: DowncastSync + Disposable {
    fn hub_name(&self) -> &'static str;
}
impl_downcast!(sync HubContract);

impl<T: Hub> HubContract for T {
    fn hub_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<T>())
    }
}

/// Long-lived raw connection endpoint; both its base and its marker contract.
pub trait PersistentConnection: DowncastSync {
    fn on_connected(&self, _connection_id: &str) {}

    fn on_received(&self, _connection_id: &str, _data: &str) {}

    fn on_disconnected(&self, _connection_id: &str, _stop_called: bool) {}
}
impl_downcast!(sync PersistentConnection);

/// Identifies the hub type the host wants instantiated.
#[derive(Clone)]
pub struct HubDescriptor {
    pub name: String,
    pub hub_type: ServiceKey,
    project: fn(&Instance) -> Option<Arc<dyn Hub>>,
}

impl HubDescriptor {
    pub fn of<T: Hub>() -> Self {
        Self {
            name: short_type_name(std::any::type_name::<T>()).to_string(),
            hub_type: ServiceKey::of::<T>(),
            project: project_hub::<T>,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// View an instance resolved for [`Self::hub_type`] as a hub.
    pub fn as_hub(&self, instance: &Instance) -> Option<Arc<dyn Hub>> {
        (self.project)(instance)
    }
}

impl fmt::Debug for HubDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubDescriptor")
            .field("name", &self.name)
            .field("hub_type", &self.hub_type)
            .finish()
    }
}

fn project_hub<T: Hub>(instance: &Instance) -> Option<Arc<dyn Hub>> {
    instance
        .downcast::<T>()
        .map(|hub| hub as Arc<dyn Hub>)
        .or_else(|| instance.downcast::<dyn Hub>())
}

/// Creates hub instances for the host.
pub trait HubActivator: Send + Sync {
    fn create(&self, descriptor: &HubDescriptor) -> Result<Arc<dyn Hub>, ContainerError>;
}
