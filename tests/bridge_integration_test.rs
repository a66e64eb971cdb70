//! 容器桥接的集成测试

#![allow(clippy::uninlined_format_args, clippy::print_stdout)]

use futures_util::future;
use hub_bridge::bridge::{add_signalr, add_signalr_with_types, Assembly, BridgeBuilder};
use hub_bridge::host::{
    DependencyResolver, DependencyResolverExt, Hub, HubActivator, HubContract, HubDescriptor,
    PersistentConnection,
};
use hub_bridge::infrastructure::container::{ContainerError, Disposable, Injectable};
use hub_bridge::{BridgeError, HubConfiguration, ServiceContainer, TypeDescriptor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 组件依赖的服务
trait Dependency: Send + Sync {
    fn implementation(&self) -> &'static str;
}

struct DependencyImpl;

impl Dependency for DependencyImpl {
    fn implementation(&self) -> &'static str {
        "DependencyImpl"
    }
}

/// 通过构造函数注入依赖的集线器
struct Worker {
    dep: Arc<dyn Dependency>,
    disposals: AtomicUsize,
}

impl Disposable for Worker {
    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

impl Hub for Worker {}

impl Injectable for Worker {
    fn construct(container: &ServiceContainer) -> Result<Self, ContainerError> {
        Ok(Worker {
            dep: container.resolve::<dyn Dependency>()?,
            disposals: AtomicUsize::new(0),
        })
    }
}

/// 持久连接
struct EventStream;

impl PersistentConnection for EventStream {}

impl Injectable for EventStream {
    fn construct(_container: &ServiceContainer) -> Result<Self, ContainerError> {
        Ok(EventStream)
    }
}

/// 不实现任何组件契约的类型
struct Unrelated;

fn dependency_container() -> ServiceContainer {
    let container = ServiceContainer::new();
    container.register::<dyn Dependency, _>(|_| Ok(Arc::new(DependencyImpl)));
    container
}

fn chat_assembly() -> Assembly {
    Assembly::new("chat")
        .with_type(TypeDescriptor::hub::<Worker>())
        .with_type(TypeDescriptor::persistent_connection::<EventStream>())
        .with_type(TypeDescriptor::of::<Unrelated>())
        .with_type(TypeDescriptor::of::<String>())
}

#[test]
fn test_worker_resolves_through_every_key() {
    let container = dependency_container();
    let config = HubConfiguration::new();
    add_signalr(&container, &config, &[chat_assembly()]).unwrap();

    let worker = container.resolve::<Worker>().unwrap();
    assert_eq!(worker.dep.implementation(), "DependencyImpl");

    let hub = container.resolve::<dyn Hub>().unwrap();
    let worker = hub.downcast_arc::<Worker>().ok().unwrap();
    assert_eq!(worker.dep.implementation(), "DependencyImpl");

    let contract = container.resolve::<dyn HubContract>().unwrap();
    assert_eq!(contract.hub_name(), "Worker");
    let worker = contract.downcast_arc::<Worker>().ok().unwrap();
    assert_eq!(worker.dep.implementation(), "DependencyImpl");

    for info in container
        .all_registrations()
        .iter()
        .filter(|info| info.implementation.name().ends_with("Worker"))
    {
        assert!(!info.handles_disposal, "{} must not be container-owned", info.service);
    }
}

#[test]
fn test_only_component_types_are_registered() {
    let container = dependency_container();
    let config = HubConfiguration::new();
    add_signalr(&container, &config, &[chat_assembly()]).unwrap();

    assert!(container.can_resolve::<Worker>());
    assert!(container.can_resolve::<EventStream>());
    assert!(container.can_resolve::<dyn PersistentConnection>());
    assert!(!container.can_resolve::<Unrelated>());
    assert!(!container.can_resolve::<String>());

    // 组件条目全部不归容器释放
    let component_entries: Vec<_> = container
        .all_registrations()
        .into_iter()
        .filter(|info| {
            let name = info.implementation.name();
            name.ends_with("Worker") || name.ends_with("EventStream")
        })
        .collect();
    assert_eq!(component_entries.len(), 5);
    assert!(component_entries.iter().all(|info| !info.handles_disposal));
}

#[test]
fn test_zero_candidates_register_nothing() {
    let container = ServiceContainer::new();
    let config = HubConfiguration::new();
    add_signalr_with_types(&container, &config, &[TypeDescriptor::of::<Unrelated>()]).unwrap();

    assert!(container.resolve_all::<dyn Hub>().unwrap().is_empty());
    assert!(container.resolve_all::<dyn PersistentConnection>().unwrap().is_empty());
    assert!(config.resolver().resolve::<dyn Hub>().is_none());
    assert!(config.resolver().resolve_all::<dyn Hub>().is_empty());
}

#[test]
fn test_host_resolver_and_activator_are_replaced() {
    let container = dependency_container();
    let config = HubConfiguration::new();
    add_signalr(&container, &config, &[chat_assembly()]).unwrap();

    assert!(container.can_resolve::<dyn DependencyResolver>());
    assert!(container.can_resolve::<dyn HubActivator>());

    let installed = config.resolver();
    let registered = container.resolve::<dyn DependencyResolver>().unwrap();
    assert!(Arc::ptr_eq(&installed, &registered));

    // 宿主通过定位器找到激活器
    let activator = installed.resolve::<dyn HubActivator>().unwrap();
    let hub = activator.create(&HubDescriptor::of::<Worker>()).unwrap();
    assert!(hub.downcast_arc::<Worker>().is_ok());
}

#[test]
fn test_resolver_prefers_container_and_concatenates() {
    let container = ServiceContainer::new();
    container.register::<dyn Dependency, _>(|_| Ok(Arc::new(DependencyImpl)));
    container.register::<dyn Dependency, _>(|_| Ok(Arc::new(DependencyImpl)));

    let config = HubConfiguration::new();
    struct HostDependency;
    impl Dependency for HostDependency {
        fn implementation(&self) -> &'static str {
            "HostDependency"
        }
    }
    config
        .resolver()
        .register_fn::<dyn Dependency, _>(|| Arc::new(HostDependency));

    add_signalr_with_types(&container, &config, &[]).unwrap();
    let resolver = config.resolver();

    assert_eq!(
        resolver.resolve::<dyn Dependency>().unwrap().implementation(),
        "DependencyImpl"
    );

    let all: Vec<_> = resolver
        .resolve_all::<dyn Dependency>()
        .iter()
        .map(|dep| dep.implementation())
        .collect();
    assert_eq!(all, vec!["DependencyImpl", "DependencyImpl", "HostDependency"]);
}

#[test]
fn test_unknown_service_is_absent() {
    let container = ServiceContainer::new();
    let config = HubConfiguration::new();
    add_signalr_with_types(&container, &config, &[]).unwrap();

    let resolver = config.resolver();
    assert!(resolver.resolve::<dyn Dependency>().is_none());
    assert!(resolver.resolve_all::<dyn Dependency>().is_empty());
}

#[test]
fn test_host_registration_passes_to_default_locator() {
    let container = ServiceContainer::new();
    let config = HubConfiguration::new();
    add_signalr_with_types(&container, &config, &[]).unwrap();

    config
        .resolver()
        .register_fn::<dyn Dependency, _>(|| Arc::new(DependencyImpl));

    assert!(config.resolver().resolve::<dyn Dependency>().is_some());
    assert!(!container.can_resolve::<dyn Dependency>());
}

#[test]
fn test_hub_is_disposed_exactly_once() {
    let container = dependency_container();
    let config = HubConfiguration::new();
    add_signalr(&container, &config, &[chat_assembly()]).unwrap();

    let activator = container.resolve::<dyn HubActivator>().unwrap();
    let from_activator = activator.create(&HubDescriptor::of::<Worker>()).unwrap();
    let from_resolver = config.resolver().resolve::<Worker>().unwrap();

    // 宿主在调用结束时释放集线器
    from_activator.dispose();
    from_resolver.dispose();

    container.dispose();
    drop(activator);
    drop(container);

    let from_activator = from_activator.downcast_arc::<Worker>().ok().unwrap();
    assert_eq!(from_activator.disposals.load(Ordering::SeqCst), 1);
    assert_eq!(from_resolver.disposals.load(Ordering::SeqCst), 1);
}

/// 典型的宿主启动函数：容器只在函数内部创建，只返回配置
fn start_host() -> HubConfiguration {
    let container = dependency_container();
    let config = HubConfiguration::new();
    add_signalr_with_types(&container, &config, &[TypeDescriptor::hub::<Worker>()]).unwrap();
    config
}

#[test]
fn test_configuration_keeps_container_alive() {
    let config = start_host();
    let resolver = config.resolver();

    let activator = resolver.resolve::<dyn HubActivator>().unwrap();
    let hub = activator.create(&HubDescriptor::of::<Worker>()).unwrap();
    assert!(hub.downcast_arc::<Worker>().is_ok());

    let worker = resolver.resolve::<Worker>().unwrap();
    assert_eq!(worker.dep.implementation(), "DependencyImpl");
    assert_eq!(resolver.resolve_all::<dyn Hub>().len(), 1);
    assert!(config.container().is_some());
}

#[test]
fn test_adapters_outlive_container() {
    let config = start_host();
    let resolver = config.resolver();
    let activator = resolver.resolve::<dyn HubActivator>().unwrap();
    drop(config);

    assert!(resolver.resolve::<Worker>().is_none());
    assert!(resolver.resolve_all::<dyn Hub>().is_empty());
    assert!(matches!(
        activator.create(&HubDescriptor::of::<Worker>()),
        Err(ContainerError::ContainerDisposed)
    ));
}

#[test]
fn test_unregistered_hub_fails_activation() {
    let container = dependency_container();
    let config = HubConfiguration::new();
    add_signalr_with_types(&container, &config, &[]).unwrap();

    let activator = container.resolve::<dyn HubActivator>().unwrap();
    let result = activator.create(&HubDescriptor::of::<Worker>());

    assert!(matches!(
        result,
        Err(ContainerError::ServiceNotRegistered { .. })
    ));
}

#[test]
fn test_missing_arguments_fail_before_registration() {
    let container = ServiceContainer::new();
    let config = HubConfiguration::new();
    let assemblies = [chat_assembly()];

    let error = BridgeBuilder::new()
        .configuration(&config)
        .assemblies(&assemblies)
        .build()
        .unwrap_err();
    assert!(matches!(error, BridgeError::MissingArgument("container")));
    assert!(error.to_string().contains("container"));

    let error = BridgeBuilder::new()
        .container(&container)
        .assemblies(&assemblies)
        .build()
        .unwrap_err();
    assert!(matches!(error, BridgeError::MissingArgument("config")));

    let error = BridgeBuilder::new()
        .container(&container)
        .configuration(&config)
        .build()
        .unwrap_err();
    assert!(matches!(error, BridgeError::MissingArgument("types")));

    assert!(container.all_registrations().is_empty());
}

#[tokio::test]
async fn test_concurrent_resolution() {
    let container = dependency_container();
    let config = Arc::new(HubConfiguration::new());
    add_signalr(&container, &config, &[chat_assembly()]).unwrap();

    let activator = container.resolve::<dyn HubActivator>().unwrap();
    let mut handles = vec![];
    for i in 0..32 {
        let activator = activator.clone();
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                activator
                    .create(&HubDescriptor::of::<Worker>())
                    .map(|_| ())
                    .is_ok()
            } else {
                config.resolver().resolve::<dyn Hub>().is_some()
            }
        }));
    }

    let results = future::join_all(handles).await;
    for result in results {
        assert!(result.unwrap());
    }

    let stats = container.stats();
    assert_eq!(stats.failed_resolutions, 0);
    assert_eq!(stats.tracked_disposables, 0);
    println!("{}", stats.summary());
}
