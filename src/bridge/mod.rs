//! 容器与集线器宿主之间的桥接
//!
//! 配置入口把候选类型中的集线器和持久连接注册进容器，
//! 并把宿主的服务定位器与集线器激活器替换为容器适配器。

pub mod activator;
pub mod discovery;
pub mod registrar;
pub mod resolver;

pub use activator::ContainerHubActivator;
pub use discovery::{component_kind, Assembly, ComponentKind, TypeDescriptor};
pub use registrar::{
    register_components, register_hubs, register_kinds, register_persistent_connections,
    RegistrationReport,
};
pub use resolver::ContainerDependencyResolver;

use crate::config::RegistrationSettings;
use crate::errors::BridgeError;
use crate::host::{DependencyResolver, HubActivator, HubConfiguration};
use crate::infrastructure::container::ServiceContainer;
use crate::logging::OperationTimer;
use std::sync::Arc;

/// 桥接配置构建器
///
/// 每个参数都可能缺失；`build` 会报告第一个缺失的参数名。
#[derive(Default)]
pub struct BridgeBuilder<'a> {
    container: Option<&'a ServiceContainer>,
    config: Option<&'a HubConfiguration>,
    candidates: Option<Vec<&'a TypeDescriptor>>,
    settings: RegistrationSettings,
}

impl<'a> BridgeBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(mut self, container: &'a ServiceContainer) -> Self {
        self.container = Some(container);
        self
    }

    pub fn configuration(mut self, config: &'a HubConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    /// 扫描程序集中导出的全部类型
    pub fn assemblies(mut self, assemblies: &'a [Assembly]) -> Self {
        self.candidates
            .get_or_insert_with(Vec::new)
            .extend(assemblies.iter().flat_map(Assembly::types));
        self
    }

    pub fn types(mut self, types: &'a [TypeDescriptor]) -> Self {
        self.candidates.get_or_insert_with(Vec::new).extend(types);
        self
    }

    pub fn settings(mut self, settings: RegistrationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 注册组件并接管宿主的解析入口，返回同一个容器
    pub fn build(self) -> Result<ServiceContainer, BridgeError> {
        let container = self.container.ok_or(BridgeError::MissingArgument("container"))?;
        let config = self.config.ok_or(BridgeError::MissingArgument("config"))?;
        let candidates = self.candidates.ok_or(BridgeError::MissingArgument("types"))?;

        let timer = OperationTimer::new("bridge_configuration")
            .with_metadata("candidates", candidates.len());

        let resolver: Arc<dyn DependencyResolver> =
            Arc::new(ContainerDependencyResolver::new(container, config.resolver()));
        let activator: Arc<dyn HubActivator> = Arc::new(ContainerHubActivator::new(container));
        container
            .register_instance::<dyn DependencyResolver>(resolver)
            .register_instance::<dyn HubActivator>(activator);

        config.set_resolver(container.resolve::<dyn DependencyResolver>()?);
        // 适配器只持有弱引用，由宿主配置保持容器存活
        config.attach_container(container.clone());

        let report = register_kinds(container, candidates, &self.settings.kinds());
        tracing::info!(
            hubs = report.hubs.len(),
            persistent_connections = report.persistent_connections.len(),
            "Hub host now resolves through the container"
        );
        timer.finish();

        Ok(container.clone())
    }
}

/// 注册程序集中的集线器和持久连接
pub fn add_signalr(
    container: &ServiceContainer,
    config: &HubConfiguration,
    assemblies: &[Assembly],
) -> Result<ServiceContainer, BridgeError> {
    BridgeBuilder::new()
        .container(container)
        .configuration(config)
        .assemblies(assemblies)
        .build()
}

/// 注册显式给出的类型
pub fn add_signalr_with_types(
    container: &ServiceContainer,
    config: &HubConfiguration,
    types: &[TypeDescriptor],
) -> Result<ServiceContainer, BridgeError> {
    BridgeBuilder::new()
        .container(container)
        .configuration(config)
        .types(types)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{DependencyResolverExt, Hub};
    use crate::infrastructure::container::{ContainerError, Disposable, Injectable};

    struct LobbyHub;

    impl Disposable for LobbyHub {
        fn dispose(&self) {}
    }

    impl Hub for LobbyHub {}

    impl Injectable for LobbyHub {
        fn construct(_container: &ServiceContainer) -> Result<Self, ContainerError> {
            Ok(LobbyHub)
        }
    }

    #[test]
    fn test_missing_arguments_are_named() {
        let container = ServiceContainer::new();
        let config = HubConfiguration::new();
        let types = [TypeDescriptor::hub::<LobbyHub>()];

        let result = BridgeBuilder::new().configuration(&config).types(&types).build();
        assert!(matches!(result, Err(BridgeError::MissingArgument("container"))));

        let result = BridgeBuilder::new().container(&container).types(&types).build();
        assert!(matches!(result, Err(BridgeError::MissingArgument("config"))));

        let result = BridgeBuilder::new()
            .container(&container)
            .configuration(&config)
            .build();
        assert!(matches!(result, Err(BridgeError::MissingArgument("types"))));

        assert!(container.all_registrations().is_empty());
    }

    #[test]
    fn test_empty_assemblies_are_not_missing() {
        let container = ServiceContainer::new();
        let config = HubConfiguration::new();

        add_signalr(&container, &config, &[]).unwrap();

        assert!(container.can_resolve::<dyn DependencyResolver>());
        assert!(!container.can_resolve::<dyn Hub>());
    }

    #[test]
    fn test_assemblies_and_types_combine() {
        let container = ServiceContainer::new();
        let config = HubConfiguration::new();
        let assemblies = [Assembly::new("chat").with_type(TypeDescriptor::hub::<LobbyHub>())];
        let types = [TypeDescriptor::hub::<LobbyHub>(), TypeDescriptor::of::<String>()];

        BridgeBuilder::new()
            .container(&container)
            .configuration(&config)
            .assemblies(&assemblies)
            .types(&types)
            .build()
            .unwrap();

        assert_eq!(container.resolve_all::<dyn Hub>().unwrap().len(), 1);
        assert!(config.resolver().resolve::<LobbyHub>().is_some());
    }

    #[test]
    fn test_settings_limit_kinds() {
        let container = ServiceContainer::new();
        let config = HubConfiguration::new();
        let types = [TypeDescriptor::hub::<LobbyHub>()];
        let settings = RegistrationSettings {
            hubs: false,
            persistent_connections: true,
        };

        BridgeBuilder::new()
            .container(&container)
            .configuration(&config)
            .types(&types)
            .settings(settings)
            .build()
            .unwrap();

        assert!(!container.can_resolve::<LobbyHub>());
    }
}
