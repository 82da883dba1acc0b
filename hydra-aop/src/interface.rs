//! 可代理的接口
//!
//! 接口（trait 对象类型）通过 [`Interface`] 暴露自己的方法集合，并负责把一个
//! [`Proxy`] 转换成它自己的 `Arc`。转发实现 `impl Trait for Proxy<dyn Trait>`
//! 由使用者手写，每个方法调用 [`Proxy::call`]。
//!
//! 接口方法应当返回 `anyhow::Result<T>`，转发时直接返回 `self.call(..)` 的结果，
//! 让拦截器链和目标的失败原样到达调用方。

use std::marker::PhantomData;
use std::sync::Arc;

use hydra_core::{Marker, TypeKey};

use crate::method::{Method, MethodBuilder};
use crate::proxy::Proxy;

/// 可代理的接口
pub trait Interface: Send + Sync + 'static {
    /// 接口描述，通常保存在 `once_cell::sync::Lazy` 中
    fn description() -> Arc<InterfaceDescription>;

    /// 把代理包装成接口本身
    fn from_proxy(proxy: Proxy<Self>) -> Arc<Self>;
}

/// 接口描述：类型级标记加上方法集合
#[derive(Debug)]
pub struct InterfaceDescription {
    key: TypeKey,
    markers: Vec<Marker>,
    methods: Vec<Method>,
}

impl InterfaceDescription {
    /// 开始描述接口 `T`
    pub fn of<T: ?Sized + 'static>() -> InterfaceBuilder<T> {
        InterfaceBuilder {
            markers: Vec::new(),
            methods: Vec::new(),
            _interface: PhantomData,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// 按名称查找方法
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name() == name)
    }
}

/// [`InterfaceDescription`] 构建器
pub struct InterfaceBuilder<T: ?Sized> {
    markers: Vec<Marker>,
    methods: Vec<MethodBuilder>,
    _interface: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + 'static> InterfaceBuilder<T> {
    /// 接口级标记，对所有方法生效
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(self) -> InterfaceDescription {
        let key = TypeKey::of::<T>();
        let methods = self
            .methods
            .into_iter()
            .map(MethodBuilder::build)
            .map(|method| {
                if method.declaring_type() != key {
                    tracing::warn!(
                        "Method '{}' is declared on '{}' but listed in '{}'",
                        method.name(),
                        method.declaring_type(),
                        key
                    );
                }
                method.with_declaring_markers(&self.markers)
            })
            .collect();

        InterfaceDescription {
            key,
            markers: self.markers,
            methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::returning;

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct Audited;

    #[test]
    fn test_type_markers_copied_into_methods() {
        let description = InterfaceDescription::of::<dyn Clock>()
            .marker(Marker::of::<Audited>())
            .method(Method::builder::<dyn Clock, _>("now", |clock, _| returning(clock.now())))
            .build();

        let now = description.method("now").unwrap();
        assert_eq!(now.declaring_markers(), &[Marker::of::<Audited>()]);
        assert_eq!(description.key(), TypeKey::of::<dyn Clock>());
        assert!(description.method("later").is_none());
    }
}
