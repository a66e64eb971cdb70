//! 基础设施层
//!
//! 提供依赖注入容器实现：
//! - 类型擦除的服务注册表
//! - 单例 / 瞬态生命周期
//! - 可选的容器托管释放

// 容器实现
pub mod container;

// 重新导出API
pub use container::{ContainerError, ServiceContainer, ServiceLifetime};
pub use container::{Disposable, Injectable, Instance, ServiceKey, ServiceProvider};
