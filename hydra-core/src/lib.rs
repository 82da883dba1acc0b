// hydra-core: 基于类型的依赖注入注册表
//
// 提供类型安全的依赖注入功能，支持：
// - 固定实例、自定义工厂和类提供者三种绑定方式
// - 构造函数注入和属性注入（通过显式的类型描述）
// - 单例和原型作用域
// - 循环依赖检测和静态依赖图校验

pub mod error;
pub mod instance;
pub mod introspection;
pub mod key;
pub mod logging;
pub mod marker;
pub mod planner;
pub mod provider;
pub mod registry;
pub mod scope;
pub mod utils;

// 重新导出常用类型
pub use error::{ContainerError, ContainerResult};
pub use instance::Instance;
pub use introspection::{
    Arguments, ConstructorDescriptor, Introspect, PropertyDescriptor, TypeDescription,
};
pub use key::TypeKey;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use marker::{find_marker, Inject, Marker};
pub use planner::ConstructionRecipe;
pub use provider::{Provider, ProviderKind};
pub use registry::{InjectorRegistry, Resolver};
pub use scope::Scope;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::instance::Instance;
    pub use crate::introspection::{
        Arguments, ConstructorDescriptor, Introspect, PropertyDescriptor, TypeDescription,
    };
    pub use crate::key::TypeKey;
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::marker::{Inject, Marker};
    pub use crate::registry::{InjectorRegistry, Resolver};
    pub use crate::scope::Scope;
    // Re-export anyhow for convenience
    pub use anyhow::{anyhow, Context};
}
