//! 与依赖注入注册表的集成
//!
//! 把类提供者构造出的实例包装成代理后再交给调用方。

use std::sync::Arc;

use hydra_core::{ContainerResult, InjectorRegistry, Introspect, Scope};

use crate::interface::Interface;
use crate::registry::InterceptorRegistry;

/// `InjectorRegistry` 的代理注册扩展
pub trait ProxyRegistration {
    /// 把接口 `T` 绑定到实现类 `C`，每次 `lookup` 构造新实例并包装为代理
    fn register_proxied_class<T, C, U>(
        &self,
        interceptors: &Arc<InterceptorRegistry>,
        upcast: U,
    ) -> ContainerResult<()>
    where
        T: ?Sized + Interface,
        C: Introspect,
        U: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_proxied_class_scoped(interceptors, Scope::Prototype, upcast)
    }

    /// 同 [`register_proxied_class`](Self::register_proxied_class)，显式指定作用域
    fn register_proxied_class_scoped<T, C, U>(
        &self,
        interceptors: &Arc<InterceptorRegistry>,
        scope: Scope,
        upcast: U,
    ) -> ContainerResult<()>
    where
        T: ?Sized + Interface,
        C: Introspect,
        U: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static;
}

impl ProxyRegistration for InjectorRegistry {
    fn register_proxied_class_scoped<T, C, U>(
        &self,
        interceptors: &Arc<InterceptorRegistry>,
        scope: Scope,
        upcast: U,
    ) -> ContainerResult<()>
    where
        T: ?Sized + Interface,
        C: Introspect,
        U: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        let interceptors = Arc::clone(interceptors);
        tracing::debug!(
            "Registering proxied class '{}' for interface '{}'",
            std::any::type_name::<C>(),
            std::any::type_name::<T>()
        );
        self.register_provider_class_scoped::<T, C, _>(scope, move |bean| {
            interceptors.create_proxy(upcast(bean)).into_interface()
        })
    }
}
