use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, ContainerResult};
use crate::key::TypeKey;

/// 类型擦除后的实例
///
/// 内部保存一个 `Arc<T>`，`T` 可以是 `dyn Trait`。所有 provider 都返回这个形状，
/// 由注册表在 `lookup` 时还原为 `Arc<T>`。
pub struct Instance {
    key: TypeKey,
    value: Box<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: Box::new(value),
        }
    }

    /// 实例对应的请求类型
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// 还原为 `Arc<T>`
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(self) -> ContainerResult<Arc<T>> {
        let found = self.key;
        self.value
            .downcast::<Arc<T>>()
            .map(|value| *value)
            .map_err(|_| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: found.name().to_string(),
            })
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("type", &self.key.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_round_trip_trait_object() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let instance = Instance::new(Arc::clone(&greeter));
        assert_eq!(instance.key(), TypeKey::of::<dyn Greeter>());

        let restored = instance.downcast::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&restored, &greeter));
        assert_eq!(restored.greet(), "hello");
    }

    #[test]
    fn test_downcast_to_wrong_type() {
        let instance = Instance::new(Arc::new(42_u32));
        let error = instance.downcast::<String>().unwrap_err();
        assert!(matches!(error, ContainerError::TypeMismatch { .. }));
    }
}
