//! 动态代理
//!
//! [`Proxy`] 持有目标对象、接口描述和拦截器注册表。每次调用按方法名找到方法描述，
//! 从注册表取得（必要时编译）拦截器链并执行。
//!
//! 手写的转发实现应当让接口方法返回 `anyhow::Result`，并把 [`Proxy::call`] 的结果
//! 原样返回：拦截器或目标的失败必须到达调用方，不能被替换成默认值。
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use hydra_aop::prelude::*;
//! use once_cell::sync::Lazy;
//!
//! pub trait Greeter: Send + Sync {
//!     fn greet(&self, name: &str) -> anyhow::Result<String>;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self, name: &str) -> anyhow::Result<String> {
//!         Ok(format!("Hello, {name}"))
//!     }
//! }
//!
//! impl Interface for dyn Greeter {
//!     fn description() -> Arc<InterfaceDescription> {
//!         static DESCRIPTION: Lazy<Arc<InterfaceDescription>> = Lazy::new(|| {
//!             Arc::new(
//!                 InterfaceDescription::of::<dyn Greeter>()
//!                     .method(Method::builder::<dyn Greeter, _>("greet", |greeter, args| {
//!                         returning(greeter.greet(args.get::<String>(0)?)?)
//!                     }))
//!                     .build(),
//!             )
//!         });
//!         Arc::clone(&DESCRIPTION)
//!     }
//!
//!     fn from_proxy(proxy: Proxy<Self>) -> Arc<Self> {
//!         Arc::new(proxy)
//!     }
//! }
//!
//! impl Greeter for Proxy<dyn Greeter> {
//!     fn greet(&self, name: &str) -> anyhow::Result<String> {
//!         self.call("greet", args![name.to_string()])
//!     }
//! }
//!
//! let registry = Arc::new(InterceptorRegistry::new());
//! let target: Arc<dyn Greeter> = Arc::new(English);
//! let greeter = registry.create_proxy(target).into_interface();
//! assert_eq!(greeter.greet("world")?, "Hello, world");
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::interface::{Interface, InterfaceDescription};
use crate::invocation::{Arguments, InvocationResult, Target};
use crate::registry::InterceptorRegistry;

/// 不能通过代理调用的结构性方法
const STRUCTURAL_METHODS: &[&str] = &["eq", "ne", "hash", "fmt", "to_string", "clone"];

/// 接口 `T` 的动态代理
pub struct Proxy<T: ?Sized> {
    target: Target,
    description: Arc<InterfaceDescription>,
    registry: Arc<InterceptorRegistry>,
    _interface: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Interface> Proxy<T> {
    pub(crate) fn new(registry: Arc<InterceptorRegistry>, target: Arc<T>) -> Self {
        let description = T::description();
        tracing::debug!(
            "Creating proxy for '{}' with {} method(s)",
            description.key(),
            description.methods().len()
        );
        Self {
            target: Target::new(target),
            description,
            registry,
            _interface: PhantomData,
        }
    }

    /// 转换为接口本身
    pub fn into_interface(self) -> Arc<T> {
        T::from_proxy(self)
    }
}

impl<T: ?Sized> Proxy<T> {
    /// 调用方法，结果保持类型擦除
    ///
    /// 结构性方法返回 [`ProxyError::UnsupportedOperation`]，未知方法返回
    /// [`ProxyError::UnknownMethod`]；调用链中的失败原样传播。
    pub fn invoke(&self, name: &str, args: Arguments) -> InvocationResult {
        if STRUCTURAL_METHODS.iter().any(|structural| *structural == name) {
            return Err(ProxyError::UnsupportedOperation {
                interface: self.description.key().name().to_string(),
                method: name.to_string(),
            }
            .into());
        }

        let method = self.description.method(name).ok_or_else(|| ProxyError::UnknownMethod {
            interface: self.description.key().name().to_string(),
            method: name.to_string(),
        })?;

        let chain = self.registry.invocation(method);
        chain(&self.target, method, &args)
    }

    /// 调用方法并取出类型为 `R` 的返回值
    pub fn call<R: Any>(&self, name: &str, args: Arguments) -> anyhow::Result<R> {
        let value = self.invoke(name, args)?;
        value.downcast::<R>().map(|boxed| *boxed).map_err(|_| {
            ProxyError::ReturnTypeMismatch {
                method: name.to_string(),
                expected: type_name::<R>().to_string(),
            }
            .into()
        })
    }

    /// 被代理的目标
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn description(&self) -> &InterfaceDescription {
        &self.description
    }
}

impl<T: ?Sized> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("interface", &self.description.key().name())
            .field("target", &self.target)
            .finish()
    }
}
