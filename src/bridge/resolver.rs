//! Container-backed service locator

use crate::host::{DependencyResolver, ServiceActivator};
use crate::infrastructure::container::{
    ContainerError, Instance, ServiceContainer, ServiceKey, WeakServiceContainer,
};
use std::sync::Arc;

/// Answers host lookups from the container first, then from the host's previous
/// resolver.
///
/// Nothing produced here is disposed by the resolver; the host owns that.
pub struct ContainerDependencyResolver {
    container: WeakServiceContainer,
    fallback: Arc<dyn DependencyResolver>,
}

impl ContainerDependencyResolver {
    pub fn new(container: &ServiceContainer, fallback: Arc<dyn DependencyResolver>) -> Self {
        Self {
            container: container.downgrade(),
            fallback,
        }
    }

    pub fn fallback(&self) -> &Arc<dyn DependencyResolver> {
        &self.fallback
    }

    fn from_container(&self, service: ServiceKey) -> Option<Instance> {
        let container = self.upgrade(service)?;
        if !container.can_resolve_key(service) {
            return None;
        }

        match container.resolve_key(service) {
            Ok(instance) => Some(instance),
            Err(error) => {
                log_failure(service, &error);
                None
            }
        }
    }

    // 失败的注册只丢弃自身，其余实例按注册顺序保留
    fn all_from_container(&self, service: ServiceKey) -> Vec<Instance> {
        let Some(container) = self.upgrade(service) else {
            return Vec::new();
        };

        container
            .try_resolve_all_key(service)
            .into_iter()
            .filter_map(|result| {
                result
                    .map_err(|error| log_failure(service, &error))
                    .ok()
            })
            .collect()
    }

    fn upgrade(&self, service: ServiceKey) -> Option<ServiceContainer> {
        let container = self.container.upgrade();
        if container.is_none() {
            tracing::warn!(
                service = service.name(),
                "Container has been dropped, only the fallback resolver answers"
            );
        }
        container
    }
}

fn log_failure(service: ServiceKey, error: &ContainerError) {
    tracing::warn!(
        service = service.name(),
        error = %error,
        "Container could not produce a registered service, falling back"
    );
}

impl DependencyResolver for ContainerDependencyResolver {
    fn get_service(&self, service: ServiceKey) -> Option<Instance> {
        if let Some(instance) = self.from_container(service) {
            tracing::trace!(service = service.name(), "Resolved from container");
            return Some(instance);
        }
        self.fallback.get_service(service)
    }

    fn get_services(&self, service: ServiceKey) -> Vec<Instance> {
        let mut services = self.all_from_container(service);
        services.extend(self.fallback.get_services(service));
        services
    }

    fn register(&self, service: ServiceKey, activator: ServiceActivator) {
        self.fallback.register(service, activator);
    }

    fn register_many(&self, service: ServiceKey, activators: Vec<ServiceActivator>) {
        self.fallback.register_many(service, activators);
    }
}
