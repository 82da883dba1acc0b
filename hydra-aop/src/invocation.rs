//! 调用上下文
//!
//! 一次代理调用由三部分组成：目标对象、方法描述和参数列表。拦截器链中的每一环
//! 都接收同样的三元组，并返回同样形状的结果。

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::method::Method;

/// 方法返回值（类型擦除）
pub type Value = Box<dyn Any + Send>;

/// 调用结果，失败原样在链中传播
pub type InvocationResult = anyhow::Result<Value>;

/// 可调用的链（或链的剩余部分）
pub type Invocation = Arc<dyn Fn(&Target, &Method, &Arguments) -> InvocationResult + Send + Sync>;

/// 把普通值包装为成功的调用结果
pub fn returning<T: Any + Send>(value: T) -> InvocationResult {
    Ok(Box::new(value))
}

/// 被代理的目标对象
///
/// 内部保存 `Arc<T>`（`T` 通常是 `dyn Trait`），由方法的终端调用还原。
#[derive(Clone)]
pub struct Target {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Target {
    pub fn new<T: ?Sized + Send + Sync + 'static>(target: Arc<T>) -> Self {
        Self {
            type_name: type_name::<T>(),
            value: Arc::new(target),
        }
    }

    /// 目标的声明类型名称
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 还原为 `Arc<T>`
    pub fn downcast_ref<T: ?Sized + Send + Sync + 'static>(&self) -> Option<&Arc<T>> {
        self.value.downcast_ref::<Arc<T>>()
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.type_name)
    }
}

/// 参数列表
#[derive(Default)]
pub struct Arguments {
    values: Vec<(&'static str, Box<dyn Any + Send + Sync>)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个参数
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.push((type_name::<T>(), Box::new(value)));
    }

    /// 按位置读取参数
    pub fn get<T: Any>(&self, index: usize) -> anyhow::Result<&T> {
        let mismatch = |found: &str| ProxyError::ArgumentMismatch {
            index,
            expected: type_name::<T>().to_string(),
            found: found.to_string(),
        };

        let (name, value) = self
            .values
            .get(index)
            .ok_or_else(|| mismatch("nothing"))?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch(*name).into())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 各参数的类型名称
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(name, _)| *name)
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.type_names()).finish()
    }
}

/// 构建 [`Arguments`]
///
/// ```
/// use hydra_aop::args;
///
/// let args = args!["alice".to_string(), 42_u32];
/// assert_eq!(args.len(), 2);
/// assert_eq!(*args.get::<u32>(1).unwrap(), 42);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Arguments::new()
    };
    ($($value:expr),+ $(,)?) => {{
        let mut arguments = $crate::Arguments::new();
        $(arguments.push($value);)+
        arguments
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    struct Fixed;

    impl Named for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_target_downcast() {
        let named: Arc<dyn Named> = Arc::new(Fixed);
        let target = Target::new(Arc::clone(&named));

        let back = target.downcast_ref::<dyn Named>().unwrap();
        assert!(Arc::ptr_eq(back, &named));
        assert_eq!(back.name(), "fixed");
        assert!(target.downcast_ref::<Fixed>().is_none());
    }

    #[test]
    fn test_argument_mismatch() {
        let args = crate::args![1_u8];

        let error = args.get::<String>(0).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ProxyError>(),
            Some(ProxyError::ArgumentMismatch { index: 0, found, .. }) if found == "u8"
        ));

        let error = args.get::<u8>(3).unwrap_err();
        assert!(error.to_string().contains("nothing"));
    }

    #[test]
    fn test_empty_args() {
        let args = crate::args![];
        assert!(args.is_empty());
        assert_eq!(format!("{:?}", crate::args![1_i32, "x"]), r#"["i32", "&str"]"#);
    }
}
