//! Hydra AOP - 拦截器链与动态代理
//!
//! 提供基于标记的方法拦截，支持：
//! - 按 声明类型 / 方法 / 参数 上的标记选择拦截器
//! - 环绕通知（before/after，失败和 panic 时也保证执行 after）
//! - 每个方法的拦截器链只编译一次并缓存，注册新拦截器时整体失效
//! - 手写转发的动态代理，以及与依赖注入注册表的集成

pub mod advice;
pub mod error;
pub mod error_info;
pub mod injection;
pub mod interceptor;
pub mod interface;
pub mod invocation;
pub mod method;
pub mod proxy;
pub mod registry;

// 重新导出核心类型
pub use advice::{LoggingAdvice, TimingAdvice};
pub use error::ProxyError;
pub use error_info::ErrorInfo;
pub use injection::ProxyRegistration;
pub use interceptor::{interceptor_fn, AroundAdvice, AroundInterceptor, Interceptor, Outcome};
pub use interface::{Interface, InterfaceDescription};
pub use invocation::{returning, Arguments, Invocation, InvocationResult, Target, Value};
pub use method::{Method, MethodBuilder, MethodId, Parameter};
pub use proxy::Proxy;
pub use registry::InterceptorRegistry;

/// 预导入模块
pub mod prelude {
    pub use crate::advice::{LoggingAdvice, TimingAdvice};
    pub use crate::args;
    pub use crate::error::ProxyError;
    pub use crate::injection::ProxyRegistration;
    pub use crate::interceptor::{interceptor_fn, AroundAdvice, Interceptor, Outcome};
    pub use crate::interface::{Interface, InterfaceDescription};
    pub use crate::invocation::{returning, Arguments, Invocation, InvocationResult, Target};
    pub use crate::method::Method;
    pub use crate::proxy::Proxy;
    pub use crate::registry::InterceptorRegistry;
    pub use hydra_core::Marker;
}
