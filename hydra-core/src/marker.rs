//! 标记（Marker）
//!
//! 标记是一个名义上的标签类型，相当于其他生态中的注解。它既用来标识
//! 构造函数/属性是否参与注入，也用作拦截器注册表的键。

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::key::TypeKey;

/// 注入标记
///
/// 带有此标记的构造函数会被选为注入构造函数，带有此标记且可写的属性会在
/// 构造后被注入。
#[derive(Debug, Clone, Copy, Default)]
pub struct Inject;

/// 标记实例
///
/// 相等性只由标记类型决定；`value` 是附带的静态参数（例如重命名），不参与比较。
#[derive(Clone, Copy)]
pub struct Marker {
    key: TypeKey,
    value: Option<&'static str>,
}

impl Marker {
    /// 创建类型 `M` 的标记
    pub fn of<M: 'static>() -> Self {
        Self {
            key: TypeKey::of::<M>(),
            value: None,
        }
    }

    /// 附带一个静态参数
    pub fn with_value(mut self, value: &'static str) -> Self {
        self.value = Some(value);
        self
    }

    /// 注入标记的简写
    pub fn inject() -> Self {
        Self::of::<Inject>()
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn value(&self) -> Option<&'static str> {
        self.value
    }

    /// 是否为类型 `M` 的标记
    pub fn is<M: 'static>(&self) -> bool {
        self.key == TypeKey::of::<M>()
    }
}

impl PartialEq for Marker {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Marker {}

impl Hash for Marker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(value) => write!(f, "@{}({:?})", self.key.simple_name(), value),
            None => write!(f, "@{}", self.key.simple_name()),
        }
    }
}

/// 在标记列表中查找类型 `M` 的标记
pub fn find_marker<M: 'static>(markers: &[Marker]) -> Option<&Marker> {
    markers.iter().find(|marker| marker.is::<M>())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Column;

    #[test]
    fn test_value_does_not_affect_equality() {
        let plain = Marker::of::<Column>();
        let renamed = Marker::of::<Column>().with_value("USER_NAME");
        assert_eq!(plain, renamed);
        assert_eq!(renamed.value(), Some("USER_NAME"));
        assert_ne!(plain, Marker::inject());
    }

    #[test]
    fn test_find_marker() {
        let markers = [Marker::inject(), Marker::of::<Column>().with_value("ID")];
        assert_eq!(find_marker::<Column>(&markers).and_then(Marker::value), Some("ID"));
        assert!(find_marker::<String>(&markers).is_none());
        assert_eq!(format!("{:?}", markers[0]), "@Inject");
    }
}
