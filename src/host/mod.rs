//! Host framework contracts
//!
//! The hub host owns request and connection lifecycles. It obtains services through
//! a [`DependencyResolver`] installed on its [`HubConfiguration`] and hub instances
//! through a [`HubActivator`]; both can be replaced by container-backed adapters.

pub mod components;
pub mod configuration;
pub mod resolver;

pub use components::{Hub, HubActivator, HubContract, HubDescriptor, PersistentConnection};
pub use configuration::HubConfiguration;
pub use resolver::{
    DefaultDependencyResolver, DependencyResolver, DependencyResolverExt, ServiceActivator,
};

/// Last path segment of a type name, e.g. `ChatHub` for `app::hubs::ChatHub`
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}
