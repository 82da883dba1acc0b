//! Provider - 注册表中每个类型绑定的零参工厂
//!
//! 三种来源（固定实例、自定义工厂、类配方）在内部统一为同一个形状：
//! `Fn(&Resolver) -> ContainerResult<Instance>`。

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::ContainerResult;
use crate::instance::Instance;
use crate::key::TypeKey;
use crate::planner::ConstructionRecipe;
use crate::registry::Resolver;
use crate::scope::Scope;

/// 统一后的工厂函数
pub type ProviderFn = Arc<dyn Fn(&Resolver<'_>) -> ContainerResult<Instance> + Send + Sync>;

/// Provider 的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// 固定实例，每次返回同一个值
    Instance,
    /// 用户提供的任意工厂
    Custom,
    /// 由构造配方生成
    Class(Scope),
}

/// 注册项中保存的 provider
#[derive(Clone)]
pub struct Provider {
    kind: ProviderKind,
    dependencies: Vec<TypeKey>,
    factory: ProviderFn,
}

impl Provider {
    /// 固定实例
    pub fn instance<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            kind: ProviderKind::Instance,
            dependencies: Vec::new(),
            factory: Arc::new(move |_| Ok(Instance::new(Arc::clone(&value)))),
        }
    }

    /// 自定义工厂，可以通过 resolver 查找其他类型
    pub fn custom<T, F>(factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            kind: ProviderKind::Custom,
            dependencies: Vec::new(),
            factory: Arc::new(move |resolver| factory(resolver).map(Instance::new)),
        }
    }

    /// 由构造配方生成的类提供者
    ///
    /// `upcast` 把具体类型转换为请求类型（通常是 `dyn Trait`）。
    pub fn class<T, C, U>(recipe: ConstructionRecipe<C>, scope: Scope, upcast: U) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        C: Send + Sync + 'static,
        U: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        let dependencies = recipe.dependencies();
        let factory: ProviderFn = match scope {
            Scope::Prototype => Arc::new(move |resolver| {
                recipe.execute(resolver).map(|bean| Instance::new(upcast(bean)))
            }),
            Scope::Singleton => {
                let cell: OnceCell<Arc<T>> = OnceCell::new();
                Arc::new(move |resolver| {
                    cell.get_or_try_init(|| recipe.execute(resolver).map(&upcast))
                        .map(|bean| Instance::new(Arc::clone(bean)))
                })
            }
        };

        Self {
            kind: ProviderKind::Class(scope),
            dependencies,
            factory,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// 静态可知的依赖（仅类提供者有）
    pub fn dependencies(&self) -> &[TypeKey] {
        &self.dependencies
    }

    pub(crate) fn factory(&self) -> ProviderFn {
        Arc::clone(&self.factory)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
