//! Container module
//!
//! 类型键控的依赖注入容器：桥接层把宿主框架的组件创建委托给它。

pub mod registry;
pub mod service_container;

pub use registry::{
    Disposable, Injectable, Instance, RegistrationInfo, RegistrationOptions, ServiceKey,
    ServiceProvider,
};
pub use service_container::{ContainerError, ContainerStats, ServiceContainer, WeakServiceContainer};

/// 服务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceLifetime {
    /// Single instance per registration, created on first resolve
    Singleton,
    /// New instance per resolve
    Transient,
}
