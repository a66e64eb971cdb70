//! 服务注册表的基础类型
//!
//! 容器以 [`ServiceKey`] 为键保存注册信息，解析结果统一擦除为 [`Instance`]。
//! `Instance` 内部保存的是服务类型 `S` 的 `Arc<S>`，因此 trait 对象（如 `dyn Hub`）
//! 与具体类型都可以作为服务键，并且可以安全地向下转型回 `Arc<S>`。

use super::service_container::{ContainerError, ServiceContainer};
use super::ServiceLifetime;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// 可请求类型的标识：`TypeId` 加上用于诊断的类型名
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    /// 获取类型 `S` 的服务键，`S` 可以是 trait 对象
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 类型擦除的服务实例
#[derive(Clone)]
pub struct Instance {
    service: ServiceKey,
    value: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// 以服务类型 `S` 包装实例
    pub fn new<S: ?Sized + Send + Sync + 'static>(service: Arc<S>) -> Self {
        Self {
            service: ServiceKey::of::<S>(),
            value: Arc::new(service),
        }
    }

    /// 实例被包装时使用的服务键
    pub fn service_key(&self) -> ServiceKey {
        self.service
    }

    /// 向下转型为 `Arc<S>`；服务类型不匹配时返回 `None`
    pub fn downcast<S: ?Sized + 'static>(&self) -> Option<Arc<S>> {
        self.value.downcast_ref::<Arc<S>>().cloned()
    }

    pub fn is<S: ?Sized + 'static>(&self) -> bool {
        self.value.is::<Arc<S>>()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("service", &self.service).finish()
    }
}

/// 释放钩子
///
/// 宿主框架在请求或连接结束时直接调用；只有 `handles_disposal` 为真的注册
/// 才会由容器在自身释放时调用。
pub trait Disposable: Send + Sync {
    fn dispose(&self);
}

/// 构造函数注入：从容器解析依赖并构造自身
pub trait Injectable: Sized + Send + Sync + 'static {
    fn construct(container: &ServiceContainer) -> Result<Self, ContainerError>;
}

/// 服务提供者trait
pub trait ServiceProvider: Send + Sync + 'static {
    type Service: ?Sized + Send + Sync + 'static;

    /// 创建服务实例
    fn create(&self, container: &ServiceContainer) -> Result<Arc<Self::Service>, ContainerError>;

    /// 实例的释放钩子；容器仅在注册声明托管释放时记录它
    fn disposer(&self, _service: &Arc<Self::Service>) -> Option<Arc<dyn Disposable>> {
        None
    }

    /// 实现类型，仅用于注册表查询
    fn implementation_key(&self) -> ServiceKey {
        ServiceKey::of::<Self::Service>()
    }
}

/// 一次实例化的结果
pub(crate) struct Activation {
    pub(crate) instance: Instance,
    pub(crate) disposer: Option<Arc<dyn Disposable>>,
}

/// 类型擦除的服务提供者
pub(crate) trait ErasedServiceProvider: Send + Sync {
    fn create_erased(&self, container: &ServiceContainer) -> Result<Activation, ContainerError>;
}

impl<P: ServiceProvider> ErasedServiceProvider for P {
    fn create_erased(&self, container: &ServiceContainer) -> Result<Activation, ContainerError> {
        let service = self.create(container)?;
        let disposer = self.disposer(&service);
        Ok(Activation {
            instance: Instance::new(service),
            disposer,
        })
    }
}

/// 函数式服务工厂
pub struct FactoryProvider<S: ?Sized, F> {
    factory: F,
    _phantom: PhantomData<fn() -> Arc<S>>,
}

impl<S: ?Sized, F> FactoryProvider<S, F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            _phantom: PhantomData,
        }
    }
}

impl<S, F> ServiceProvider for FactoryProvider<S, F>
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(&ServiceContainer) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
{
    type Service = S;

    fn create(&self, container: &ServiceContainer) -> Result<Arc<S>, ContainerError> {
        (self.factory)(container)
    }
}

/// 预先创建的实例
pub struct InstanceProvider<S: ?Sized> {
    instance: Arc<S>,
}

impl<S: ?Sized> InstanceProvider<S> {
    pub fn new(instance: Arc<S>) -> Self {
        Self { instance }
    }
}

impl<S: ?Sized + Send + Sync + 'static> ServiceProvider for InstanceProvider<S> {
    type Service = S;

    fn create(&self, _container: &ServiceContainer) -> Result<Arc<S>, ContainerError> {
        Ok(self.instance.clone())
    }
}

/// 通过 [`Injectable::construct`] 创建自身的具体类型
pub struct ConstructorProvider<T>(PhantomData<fn() -> T>);

impl<T> ConstructorProvider<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for ConstructorProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Injectable> ServiceProvider for ConstructorProvider<T> {
    type Service = T;

    fn create(&self, container: &ServiceContainer) -> Result<Arc<T>, ContainerError> {
        T::construct(container).map(Arc::new)
    }
}

/// 注册选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationOptions {
    pub lifetime: ServiceLifetime,
    /// 容器是否在自身释放时释放它创建的实例
    pub handles_disposal: bool,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self::transient()
    }
}

impl RegistrationOptions {
    pub fn transient() -> Self {
        Self {
            lifetime: ServiceLifetime::Transient,
            handles_disposal: true,
        }
    }

    pub fn singleton() -> Self {
        Self {
            lifetime: ServiceLifetime::Singleton,
            handles_disposal: true,
        }
    }

    /// 实例生命周期由外部（宿主框架）负责
    pub fn externally_owned(mut self) -> Self {
        self.handles_disposal = false;
        self
    }
}

/// 服务注册信息
pub(crate) struct Registration {
    pub(crate) sequence: u64,
    pub(crate) service: ServiceKey,
    pub(crate) implementation: ServiceKey,
    pub(crate) options: RegistrationOptions,
    pub(crate) provider: Arc<dyn ErasedServiceProvider>,
    pub(crate) singleton: OnceCell<Instance>,
}

impl Registration {
    pub(crate) fn info(&self) -> RegistrationInfo {
        RegistrationInfo {
            service: self.service,
            implementation: self.implementation,
            lifetime: self.options.lifetime,
            handles_disposal: self.options.handles_disposal,
        }
    }
}

/// 注册表条目的只读视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub service: ServiceKey,
    pub implementation: ServiceKey,
    pub lifetime: ServiceLifetime,
    pub handles_disposal: bool,
}
