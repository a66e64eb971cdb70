//! Hub host configuration

use super::resolver::{DefaultDependencyResolver, DependencyResolver};
use crate::infrastructure::container::ServiceContainer;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Host configuration object; owns the active [`DependencyResolver`].
///
/// It also keeps the container behind a container-backed resolver alive, so a
/// configuration returned from startup code stays usable after the caller's
/// own container handle is gone.
pub struct HubConfiguration {
    resolver: RwLock<Arc<dyn DependencyResolver>>,
    container: RwLock<Option<ServiceContainer>>,
}

impl HubConfiguration {
    /// Starts with the host's [`DefaultDependencyResolver`] as the active resolver.
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(DefaultDependencyResolver::new()))
    }

    pub fn with_resolver(resolver: Arc<dyn DependencyResolver>) -> Self {
        Self {
            resolver: RwLock::new(resolver),
            container: RwLock::new(None),
        }
    }

    pub fn resolver(&self) -> Arc<dyn DependencyResolver> {
        self.resolver.read().clone()
    }

    /// Install `resolver`, returning the one it replaces.
    pub fn set_resolver(&self, resolver: Arc<dyn DependencyResolver>) -> Arc<dyn DependencyResolver> {
        std::mem::replace(&mut *self.resolver.write(), resolver)
    }

    /// Hold a strong handle to `container` for as long as this configuration lives.
    pub fn attach_container(&self, container: ServiceContainer) {
        *self.container.write() = Some(container);
    }

    pub fn container(&self) -> Option<ServiceContainer> {
        self.container.read().clone()
    }
}

impl Default for HubConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HubConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubConfiguration")
            .field("container", &self.container.read().is_some())
            .finish_non_exhaustive()
    }
}
