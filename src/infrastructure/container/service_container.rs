//! 服务容器实现
//!
//! - 以 `DashMap` 保存注册表，同一服务键下的注册按注册顺序排列
//! - 单个解析取最后一次注册，批量解析按注册顺序返回
//! - 注册只发生在配置阶段，运行期只读，可并发解析
//! - `handles_disposal` 为真的注册所产生的实例由容器在释放时统一释放

use super::registry::{
    ConstructorProvider, Disposable, ErasedServiceProvider, FactoryProvider, Injectable, Instance,
    InstanceProvider, Registration, RegistrationInfo, RegistrationOptions, ServiceKey,
    ServiceProvider,
};
use super::ServiceLifetime;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;

/// 容器错误类型
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 服务未注册
    #[error("Service '{type_name}' is not registered")]
    ServiceNotRegistered { type_name: &'static str },
    /// 类型转换失败
    #[error("Type cast failed: expected '{expected}', found '{actual}'")]
    TypeCastFailed {
        expected: &'static str,
        actual: &'static str,
    },
    /// 服务创建失败
    #[error("Failed to create service '{service}': {reason}")]
    CreationFailed { service: &'static str, reason: String },
    /// 容器已释放
    #[error("Container has been disposed")]
    ContainerDisposed,
}

impl ContainerError {
    pub fn not_registered(key: ServiceKey) -> Self {
        ContainerError::ServiceNotRegistered {
            type_name: key.name(),
        }
    }

    pub fn creation_failed(service: ServiceKey, reason: impl fmt::Display) -> Self {
        ContainerError::CreationFailed {
            service: service.name(),
            reason: reason.to_string(),
        }
    }
}

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicUsize,
    failed_resolutions: AtomicUsize,
    disposed_instances: AtomicUsize,
}

struct ContainerInner {
    /// 服务键 -> 按注册顺序排列的注册信息
    registrations: DashMap<TypeId, Vec<Arc<Registration>>>,
    sequence: AtomicU64,
    /// 由容器负责释放的实例
    tracked: Mutex<Vec<Arc<dyn Disposable>>>,
    disposed: AtomicBool,
    stats: InnerStats,
}

impl ContainerInner {
    fn dispose_tracked(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        let tracked = std::mem::take(&mut *self.tracked.lock());
        if tracked.is_empty() {
            return;
        }

        tracing::debug!(count = tracked.len(), "Disposing container-owned instances");
        // 后创建的先释放
        for disposable in tracked.iter().rev() {
            disposable.dispose();
            self.stats.disposed_instances.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        self.dispose_tracked();
    }
}

/// 服务容器
///
/// 克隆得到的是同一个容器的另一个句柄。最后一个句柄被丢弃时容器释放它
/// 负责的实例，效果与 [`ServiceContainer::dispose`] 相同。
#[derive(Clone)]
pub struct ServiceContainer {
    inner: Arc<ContainerInner>,
}

/// 不持有容器所有权的句柄
///
/// 注册进容器自身的适配器使用它，避免容器与适配器之间形成引用环。
#[derive(Clone)]
pub struct WeakServiceContainer {
    inner: Weak<ContainerInner>,
}

impl WeakServiceContainer {
    pub fn upgrade(&self) -> Option<ServiceContainer> {
        self.inner.upgrade().map(|inner| ServiceContainer { inner })
    }
}

impl fmt::Debug for WeakServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakServiceContainer")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl ServiceContainer {
    /// 创建新的容器实例
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registrations: DashMap::new(),
                sequence: AtomicU64::new(0),
                tracked: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
                stats: InnerStats::default(),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakServiceContainer {
        WeakServiceContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// 注册服务提供者
    ///
    /// `handles_disposal` 为真且提供者给出释放钩子时，每个创建出的实例都会被容器
    /// 记录到容器释放为止；瞬态注册每次解析都会新增一条记录。由宿主负责释放的
    /// 实例应使用 [`RegistrationOptions::externally_owned`]。
    pub fn register_provider<P: ServiceProvider>(
        &self,
        provider: P,
        options: RegistrationOptions,
    ) -> &Self {
        let implementation = provider.implementation_key();
        self.add_registration(
            ServiceKey::of::<P::Service>(),
            implementation,
            options,
            Arc::new(provider),
        )
    }

    /// 注册瞬态服务工厂，实例的释放由容器负责
    pub fn register<S, F>(&self, factory: F) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        self.register_provider(
            FactoryProvider::<S, F>::new(factory),
            RegistrationOptions::transient(),
        )
    }

    /// 注册单例服务工厂
    pub fn register_singleton<S, F>(&self, factory: F) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        self.register_provider(
            FactoryProvider::<S, F>::new(factory),
            RegistrationOptions::singleton(),
        )
    }

    /// 注册已有实例；外部创建的实例不由容器释放
    pub fn register_instance<S>(&self, instance: Arc<S>) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.register_provider(
            InstanceProvider::new(instance),
            RegistrationOptions::singleton().externally_owned(),
        )
    }

    /// 注册通过构造函数注入创建的具体类型
    pub fn register_type<T: Injectable>(&self) -> &Self {
        self.register_provider(
            ConstructorProvider::<T>::new(),
            RegistrationOptions::transient(),
        )
    }

    /// 写入一条注册；多个服务键可以共享同一个提供者
    pub(crate) fn add_registration(
        &self,
        service: ServiceKey,
        implementation: ServiceKey,
        options: RegistrationOptions,
        provider: Arc<dyn ErasedServiceProvider>,
    ) -> &Self {
        let sequence = self.inner.sequence.fetch_add(1, Ordering::SeqCst);
        let registration = Arc::new(Registration {
            sequence,
            service,
            implementation,
            options,
            provider,
            singleton: OnceCell::new(),
        });

        tracing::trace!(
            service = service.name(),
            implementation = implementation.name(),
            lifetime = ?options.lifetime,
            handles_disposal = options.handles_disposal,
            "Service registered"
        );

        self.inner
            .registrations
            .entry(service.id())
            .or_default()
            .push(registration);
        self
    }

    /// 解析服务 - 主要API
    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>, ContainerError> {
        let instance = self.resolve_key(ServiceKey::of::<S>())?;
        Self::cast::<S>(&instance)
    }

    /// 按注册顺序解析服务的所有注册
    pub fn resolve_all<S: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Vec<Arc<S>>, ContainerError> {
        self.resolve_all_key(ServiceKey::of::<S>())?
            .iter()
            .map(Self::cast::<S>)
            .collect()
    }

    /// 按服务键解析，多个注册时取最后一次注册
    pub fn resolve_key(&self, key: ServiceKey) -> Result<Instance, ContainerError> {
        self.ensure_not_disposed()?;
        self.inner
            .stats
            .total_resolutions
            .fetch_add(1, Ordering::Relaxed);

        let registration = self
            .inner
            .registrations
            .get(&key.id())
            .and_then(|entries| entries.last().cloned());

        let result = match registration {
            Some(registration) => self.activate(&registration),
            None => Err(ContainerError::not_registered(key)),
        };
        if result.is_err() {
            self.inner
                .stats
                .failed_resolutions
                .fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// 按服务键解析全部注册；没有注册时返回空列表
    pub fn resolve_all_key(&self, key: ServiceKey) -> Result<Vec<Instance>, ContainerError> {
        self.ensure_not_disposed()?;
        let registrations = self.registrations_of(key);
        self.inner
            .stats
            .total_resolutions
            .fetch_add(registrations.len(), Ordering::Relaxed);

        let result: Result<Vec<_>, _> = registrations
            .iter()
            .map(|registration| self.activate(registration))
            .collect();
        if result.is_err() {
            self.inner
                .stats
                .failed_resolutions
                .fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    /// 逐个激活服务键下的注册，按注册顺序返回每一次的结果
    ///
    /// 某个注册失败不影响其余注册。
    pub fn try_resolve_all_key(&self, key: ServiceKey) -> Vec<Result<Instance, ContainerError>> {
        if let Err(error) = self.ensure_not_disposed() {
            return vec![Err(error)];
        }
        let registrations = self.registrations_of(key);
        self.inner
            .stats
            .total_resolutions
            .fetch_add(registrations.len(), Ordering::Relaxed);

        registrations
            .iter()
            .map(|registration| {
                let result = self.activate(registration);
                if result.is_err() {
                    self.inner
                        .stats
                        .failed_resolutions
                        .fetch_add(1, Ordering::Relaxed);
                }
                result
            })
            .collect()
    }

    /// 检查服务是否已注册
    pub fn can_resolve<S: ?Sized + 'static>(&self) -> bool {
        self.can_resolve_key(ServiceKey::of::<S>())
    }

    pub fn can_resolve_key(&self, key: ServiceKey) -> bool {
        self.inner
            .registrations
            .get(&key.id())
            .is_some_and(|entries| !entries.is_empty())
    }

    /// 整个注册表，按注册顺序
    pub fn all_registrations(&self) -> Vec<RegistrationInfo> {
        let mut registrations: Vec<Arc<Registration>> = self
            .inner
            .registrations
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        registrations.sort_by_key(|registration| registration.sequence);
        registrations.iter().map(|r| r.info()).collect()
    }

    /// 某个服务键下的注册，按注册顺序
    pub fn registrations_for(&self, key: ServiceKey) -> Vec<RegistrationInfo> {
        self.registrations_of(key).iter().map(|r| r.info()).collect()
    }

    /// 释放容器负责的实例；重复调用无副作用
    ///
    /// 释放后的容器拒绝继续解析。
    pub fn dispose(&self) {
        self.inner.dispose_tracked();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// 获取容器统计信息
    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            registrations: self
                .inner
                .registrations
                .iter()
                .map(|entry| entry.value().len())
                .sum(),
            total_resolutions: self.inner.stats.total_resolutions.load(Ordering::Relaxed),
            failed_resolutions: self.inner.stats.failed_resolutions.load(Ordering::Relaxed),
            tracked_disposables: self.inner.tracked.lock().len(),
            disposed_instances: self.inner.stats.disposed_instances.load(Ordering::Relaxed),
        }
    }

    // 拷贝出注册句柄，避免在构造函数注入期间持有分片锁
    fn registrations_of(&self, key: ServiceKey) -> Vec<Arc<Registration>> {
        self.inner
            .registrations
            .get(&key.id())
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }

    fn ensure_not_disposed(&self) -> Result<(), ContainerError> {
        if self.is_disposed() {
            return Err(ContainerError::ContainerDisposed);
        }
        Ok(())
    }

    fn activate(&self, registration: &Registration) -> Result<Instance, ContainerError> {
        match registration.options.lifetime {
            ServiceLifetime::Singleton => registration
                .singleton
                .get_or_try_init(|| self.produce(registration))
                .cloned(),
            ServiceLifetime::Transient => self.produce(registration),
        }
    }

    fn produce(&self, registration: &Registration) -> Result<Instance, ContainerError> {
        let activation = registration.provider.create_erased(self)?;
        if registration.options.handles_disposal {
            if let Some(disposer) = activation.disposer {
                self.inner.tracked.lock().push(disposer);
            }
        }
        Ok(activation.instance)
    }

    fn cast<S: ?Sized + 'static>(instance: &Instance) -> Result<Arc<S>, ContainerError> {
        instance
            .downcast::<S>()
            .ok_or_else(|| ContainerError::TypeCastFailed {
                expected: std::any::type_name::<S>(),
                actual: instance.service_key().name(),
            })
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("registrations", &self.stats().registrations)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// 容器统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStats {
    pub registrations: usize,
    pub total_resolutions: usize,
    pub failed_resolutions: usize,
    /// 等待容器释放的实例数
    pub tracked_disposables: usize,
    pub disposed_instances: usize,
}

impl ContainerStats {
    /// 解析失败率
    pub fn failure_rate(&self) -> f64 {
        if self.total_resolutions == 0 {
            0.0
        } else {
            self.failed_resolutions as f64 / self.total_resolutions as f64
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Container: {} registrations, {} resolutions ({:.1}% failed), {} tracked disposables",
            self.registrations,
            self.total_resolutions,
            self.failure_rate() * 100.0,
            self.tracked_disposables
        )
    }
}
