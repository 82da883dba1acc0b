//! 统一的错误处理类型
//!
//! 容器自身的失败使用 [`ContainerError`]，用户代码（构造函数体、属性写入器、
//! 自定义工厂）的失败使用 `anyhow::Error`，再由容器包装为
//! [`ContainerError::ConstructionFailed`]。

use thiserror::Error;

/// 容器操作结果
pub type ContainerResult<T> = Result<T, ContainerError>;

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 同一类型被注册了两次
    #[error("provider for type '{0}' already exists")]
    DuplicateRegistration(String),

    /// 请求的类型没有绑定任何 provider
    #[error("no provider registered for type '{0}'")]
    UnresolvedDependency(String),

    /// 多个构造函数带有注入标记
    #[error("type '{type_name}' has {count} constructors marked for injection")]
    AmbiguousConstructor { type_name: String, count: usize },

    /// 没有带注入标记的构造函数，也没有无参构造函数
    #[error("type '{0}' has no injectable constructor and no parameterless constructor")]
    NoDefaultConstructor(String),

    /// 构造过程中再次请求了正在构造的类型
    #[error("circular dependency detected: {0}")]
    CircularDependency(String),

    /// 擦除后的实例无法还原为期望的类型
    #[error("type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    /// 构造函数体、属性写入器或自定义工厂失败
    #[error("failed to construct '{type_name}': {source}")]
    ConstructionFailed {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// 静态依赖图校验失败
    #[error("dependency validation failed: {0}")]
    DependencyValidationFailed(String),

    /// 日志系统初始化失败
    #[error("failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    /// 配置无法解析
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ContainerError {
    /// 包装用户代码的失败
    ///
    /// 如果错误本身就是容器错误（例如在构造函数体里 `?` 了一个参数类型不匹配），
    /// 则原样返回，不再二次包装。
    pub fn construction(type_name: &str, error: anyhow::Error) -> Self {
        match error.downcast::<ContainerError>() {
            Ok(container_error) => container_error,
            Err(source) => ContainerError::ConstructionFailed {
                type_name: type_name.to_string(),
                source,
            },
        }
    }
}
