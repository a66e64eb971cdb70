//! Component registration pass

use super::discovery::{component_kind, ComponentKind, TypeDescriptor};
use crate::infrastructure::container::{ServiceContainer, ServiceKey};
use std::collections::HashSet;

/// Component types registered by one registration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    pub hubs: Vec<ServiceKey>,
    pub persistent_connections: Vec<ServiceKey>,
    /// Registration-table entries added, all keys of all components
    pub entries: usize,
}

impl RegistrationReport {
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty() && self.persistent_connections.is_empty()
    }

    fn record(&mut self, kind: ComponentKind, component: ServiceKey, entries: usize) {
        match kind {
            ComponentKind::Hub => self.hubs.push(component),
            ComponentKind::PersistentConnection => self.persistent_connections.push(component),
        }
        self.entries += entries;
    }
}

/// Register every hub and persistent connection among `candidates`, hubs first.
pub fn register_components<'a, I>(container: &ServiceContainer, candidates: I) -> RegistrationReport
where
    I: IntoIterator<Item = &'a TypeDescriptor>,
{
    register_kinds(
        container,
        candidates,
        &[ComponentKind::Hub, ComponentKind::PersistentConnection],
    )
}

/// Register every hub among `candidates`.
pub fn register_hubs<'a, I>(container: &ServiceContainer, candidates: I) -> RegistrationReport
where
    I: IntoIterator<Item = &'a TypeDescriptor>,
{
    register_kinds(container, candidates, &[ComponentKind::Hub])
}

/// Register every persistent connection among `candidates`.
pub fn register_persistent_connections<'a, I>(
    container: &ServiceContainer,
    candidates: I,
) -> RegistrationReport
where
    I: IntoIterator<Item = &'a TypeDescriptor>,
{
    register_kinds(container, candidates, &[ComponentKind::PersistentConnection])
}

/// One pass per kind, in the order given. A type listed twice is registered once.
pub fn register_kinds<'a, I>(
    container: &ServiceContainer,
    candidates: I,
    kinds: &[ComponentKind],
) -> RegistrationReport
where
    I: IntoIterator<Item = &'a TypeDescriptor>,
{
    let candidates: Vec<&TypeDescriptor> = candidates.into_iter().collect();
    let mut report = RegistrationReport::default();

    for &kind in kinds {
        let mut seen = HashSet::new();

        for descriptor in &candidates {
            if component_kind(descriptor) != Some(kind) {
                continue;
            }
            if !seen.insert(descriptor.key()) {
                tracing::debug!(component = descriptor.key().name(), "Skipping duplicate candidate");
                continue;
            }
            let Some(binder) = descriptor.binder() else {
                continue;
            };

            let keys = binder.bind(container);
            tracing::debug!(
                kind = %kind,
                component = descriptor.key().name(),
                keys = ?keys,
                "Registered component"
            );
            report.record(kind, descriptor.key(), keys.len());
        }
    }

    tracing::info!(
        candidates = candidates.len(),
        hubs = report.hubs.len(),
        persistent_connections = report.persistent_connections.len(),
        entries = report.entries,
        "Component registration finished"
    );
    report
}
