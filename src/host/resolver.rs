//! Host service-locator contract and its built-in implementation

use crate::infrastructure::container::{Instance, ServiceKey};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Produces one service instance per call.
pub type ServiceActivator = Arc<dyn Fn() -> Instance + Send + Sync>;

/// The host's service-locator contract.
///
/// Lookups never fail: a service nobody provides is `None` or an empty list.
pub trait DependencyResolver: Send + Sync {
    fn get_service(&self, service: ServiceKey) -> Option<Instance>;

    fn get_services(&self, service: ServiceKey) -> Vec<Instance>;

    /// Replace the activators for `service` with a single one.
    fn register(&self, service: ServiceKey, activator: ServiceActivator);

    /// Replace the activators for `service` with `activators`, in order.
    fn register_many(&self, service: ServiceKey, activators: Vec<ServiceActivator>);
}

/// Typed helpers over [`DependencyResolver`].
pub trait DependencyResolverExt: DependencyResolver {
    fn resolve<S: ?Sized + 'static>(&self) -> Option<Arc<S>> {
        self.get_service(ServiceKey::of::<S>())
            .and_then(|instance| instance.downcast::<S>())
    }

    fn resolve_all<S: ?Sized + 'static>(&self) -> Vec<Arc<S>> {
        self.get_services(ServiceKey::of::<S>())
            .iter()
            .filter_map(Instance::downcast::<S>)
            .collect()
    }

    fn register_fn<S, F>(&self, activator: F)
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<S> + Send + Sync + 'static,
    {
        self.register(
            ServiceKey::of::<S>(),
            Arc::new(move || Instance::new(activator())),
        );
    }
}

impl<R: DependencyResolver + ?Sized> DependencyResolverExt for R {}

/// The host's own locator, used before any container is wired in.
#[derive(Default)]
pub struct DefaultDependencyResolver {
    activators: RwLock<HashMap<ServiceKey, Vec<ServiceActivator>>>,
}

impl DefaultDependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    // activators run outside the lock so they may call back into the resolver
    fn activators_for(&self, service: ServiceKey) -> Vec<ServiceActivator> {
        self.activators
            .read()
            .get(&service)
            .cloned()
            .unwrap_or_default()
    }
}

impl DependencyResolver for DefaultDependencyResolver {
    fn get_service(&self, service: ServiceKey) -> Option<Instance> {
        let activators = self.activators_for(service);
        if activators.len() > 1 {
            tracing::warn!(
                service = service.name(),
                count = activators.len(),
                "Multiple activators registered, using the first"
            );
        }
        activators.first().map(|activator| activator())
    }

    fn get_services(&self, service: ServiceKey) -> Vec<Instance> {
        self.activators_for(service)
            .iter()
            .map(|activator| activator())
            .collect()
    }

    fn register(&self, service: ServiceKey, activator: ServiceActivator) {
        self.activators.write().insert(service, vec![activator]);
    }

    fn register_many(&self, service: ServiceKey, activators: Vec<ServiceActivator>) {
        self.activators.write().insert(service, activators);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &'static str;
    }

    struct Alpha;
    struct Beta;

    impl Named for Alpha {
        fn name(&self) -> &'static str {
            "alpha"
        }
    }

    impl Named for Beta {
        fn name(&self) -> &'static str {
            "beta"
        }
    }

    #[test]
    fn test_unknown_service_is_absent() {
        let resolver = DefaultDependencyResolver::new();

        assert!(resolver.get_service(ServiceKey::of::<dyn Named>()).is_none());
        assert!(resolver.get_services(ServiceKey::of::<dyn Named>()).is_empty());
    }

    #[test]
    fn test_register_replaces() {
        let resolver = DefaultDependencyResolver::new();
        resolver.register_fn::<dyn Named, _>(|| Arc::new(Alpha));
        resolver.register_fn::<dyn Named, _>(|| Arc::new(Beta));

        let all = resolver.resolve_all::<dyn Named>();
        assert_eq!(all.len(), 1);
        assert_eq!(resolver.resolve::<dyn Named>().unwrap().name(), "beta");
    }

    #[test]
    fn test_register_many_keeps_order() {
        let resolver = DefaultDependencyResolver::new();
        let alpha: ServiceActivator =
            Arc::new(|| Instance::new(Arc::new(Alpha) as Arc<dyn Named>));
        let beta: ServiceActivator = Arc::new(|| Instance::new(Arc::new(Beta) as Arc<dyn Named>));
        resolver.register_many(ServiceKey::of::<dyn Named>(), vec![alpha, beta]);

        let names: Vec<_> = resolver
            .resolve_all::<dyn Named>()
            .iter()
            .map(|named| named.name())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(resolver.resolve::<dyn Named>().unwrap().name(), "alpha");
    }
}
