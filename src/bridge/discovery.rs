//! Candidate type descriptors and the component predicate
//!
//! Types cannot be discovered at runtime, so each candidate carries what the
//! registrar needs: its key, the contracts it implements and a binder able to
//! register it. Descriptors are built with [`TypeDescriptor::hub`],
//! [`TypeDescriptor::persistent_connection`] or, for anything else,
//! [`TypeDescriptor::of`].

use crate::host::{Hub, HubContract, PersistentConnection};
use crate::infrastructure::container::registry::ConstructorProvider;
use crate::infrastructure::container::{
    ContainerError, Injectable, RegistrationOptions, ServiceContainer, ServiceKey, ServiceProvider,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The two recognized component contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Hub,
    PersistentConnection,
}

impl ComponentKind {
    /// Marker contract whose presence identifies the kind
    pub fn marker(self) -> ServiceKey {
        match self {
            ComponentKind::Hub => ServiceKey::of::<dyn HubContract>(),
            ComponentKind::PersistentConnection => ServiceKey::of::<dyn PersistentConnection>(),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Hub => f.write_str("hub"),
            ComponentKind::PersistentConnection => f.write_str("persistent connection"),
        }
    }
}

/// Registers one concrete component type under all of its request keys.
pub(crate) trait ComponentBinder: Send + Sync {
    /// Returns the service keys registered.
    fn bind(&self, container: &ServiceContainer) -> Vec<ServiceKey>;
}

/// A candidate type for component registration
#[derive(Clone)]
pub struct TypeDescriptor {
    key: ServiceKey,
    contracts: Vec<ServiceKey>,
    binder: Option<Arc<dyn ComponentBinder>>,
}

impl TypeDescriptor {
    /// A hub: requestable as `T`, `dyn Hub` and `dyn HubContract`.
    pub fn hub<T: Hub + Injectable>() -> Self {
        Self {
            key: ServiceKey::of::<T>(),
            contracts: vec![ServiceKey::of::<dyn Hub>(), ServiceKey::of::<dyn HubContract>()],
            binder: Some(Arc::new(HubBinder::<T>(PhantomData))),
        }
    }

    /// A persistent connection: requestable as `T` and `dyn PersistentConnection`.
    pub fn persistent_connection<T: PersistentConnection + Injectable>() -> Self {
        Self {
            key: ServiceKey::of::<T>(),
            contracts: vec![ServiceKey::of::<dyn PersistentConnection>()],
            binder: Some(Arc::new(ConnectionBinder::<T>(PhantomData))),
        }
    }

    /// Any other type; never registered as a component.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            key: ServiceKey::of::<T>(),
            contracts: Vec::new(),
            binder: None,
        }
    }

    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn contracts(&self) -> &[ServiceKey] {
        &self.contracts
    }

    pub fn implements(&self, contract: ServiceKey) -> bool {
        self.contracts.contains(&contract)
    }

    pub(crate) fn binder(&self) -> Option<&Arc<dyn ComponentBinder>> {
        self.binder.as_ref()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("contracts", &self.contracts)
            .finish()
    }
}

/// Which component contract a candidate implements, if any.
pub fn component_kind(descriptor: &TypeDescriptor) -> Option<ComponentKind> {
    [ComponentKind::Hub, ComponentKind::PersistentConnection]
        .into_iter()
        .find(|kind| descriptor.implements(kind.marker()))
}

/// A named group of candidate types, typically everything one crate exposes.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    name: String,
    types: Vec<TypeDescriptor>,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    pub fn add_type(&mut self, descriptor: TypeDescriptor) {
        self.types.push(descriptor);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }
}

/// Builds `T` and views it as the requested service type `S`.
///
/// Every key of a component shares one producer.
struct Projection<T, S: ?Sized> {
    producer: Arc<ConstructorProvider<T>>,
    project: fn(Arc<T>) -> Arc<S>,
}

impl<T, S> ServiceProvider for Projection<T, S>
where
    T: Injectable,
    S: ?Sized + Send + Sync + 'static,
{
    type Service = S;

    fn create(&self, container: &ServiceContainer) -> Result<Arc<S>, ContainerError> {
        self.producer.create(container).map(self.project)
    }

    fn implementation_key(&self) -> ServiceKey {
        ServiceKey::of::<T>()
    }
}

fn bind_projection<T, S>(
    container: &ServiceContainer,
    producer: &Arc<ConstructorProvider<T>>,
    project: fn(Arc<T>) -> Arc<S>,
) -> ServiceKey
where
    T: Injectable,
    S: ?Sized + Send + Sync + 'static,
{
    let service = ServiceKey::of::<S>();
    // the host disposes components itself
    container.add_registration(
        service,
        ServiceKey::of::<T>(),
        RegistrationOptions::transient().externally_owned(),
        Arc::new(Projection {
            producer: producer.clone(),
            project,
        }),
    );
    service
}

struct HubBinder<T>(PhantomData<fn() -> T>);

impl<T: Hub + Injectable> ComponentBinder for HubBinder<T> {
    fn bind(&self, container: &ServiceContainer) -> Vec<ServiceKey> {
        let producer = Arc::new(ConstructorProvider::<T>::new());
        vec![
            bind_projection::<T, T>(container, &producer, |hub| hub),
            bind_projection::<T, dyn Hub>(container, &producer, |hub: Arc<T>| -> Arc<dyn Hub> {
                hub
            }),
            bind_projection::<T, dyn HubContract>(
                container,
                &producer,
                |hub: Arc<T>| -> Arc<dyn HubContract> { hub },
            ),
        ]
    }
}

struct ConnectionBinder<T>(PhantomData<fn() -> T>);

impl<T: PersistentConnection + Injectable> ComponentBinder for ConnectionBinder<T> {
    fn bind(&self, container: &ServiceContainer) -> Vec<ServiceKey> {
        let producer = Arc::new(ConstructorProvider::<T>::new());
        vec![
            bind_projection::<T, T>(container, &producer, |connection| connection),
            bind_projection::<T, dyn PersistentConnection>(
                container,
                &producer,
                |connection: Arc<T>| -> Arc<dyn PersistentConnection> { connection },
            ),
        ]
    }
}
