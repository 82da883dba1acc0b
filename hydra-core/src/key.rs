use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 类型键 - 注册表中请求类型的唯一标识
///
/// 相等性和哈希只取决于 `TypeId`，类型名称仅用于日志和错误信息。
/// 支持非 Sized 的类型（例如 `dyn Trait`）。
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// 获取类型 `T` 的键
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 去掉模块路径后的简短名称，`my_app::service::UserService` -> `UserService`
    pub fn simple_name(&self) -> &'static str {
        simple_name(self.name)
    }
}

/// 去掉路径前缀，保留泛型参数部分不变
pub(crate) fn simple_name(name: &'static str) -> &'static str {
    let head_end = name.find('<').unwrap_or(name.len());
    match name[..head_end].rfind("::") {
        Some(idx) => &name[idx + 2..],
        None => name,
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
