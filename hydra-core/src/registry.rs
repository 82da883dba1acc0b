//! InjectorRegistry - 依赖注入注册表
//!
//! 维护 请求类型 -> provider 的映射，并负责解析实例。注册表是一个普通的值，
//! 由组合根（通常是 `main`）创建和持有，不存在全局实例。
//!
//! # 使用约定
//!
//! 注册只应发生在启动阶段；进入解析阶段后映射视为只读。内部使用读写锁保证
//! 并发调用不会破坏映射，但不保证并发注册之间的顺序。

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ContainerError, ContainerResult};
use crate::instance::Instance;
use crate::introspection::Introspect;
use crate::key::TypeKey;
use crate::planner::ConstructionRecipe;
use crate::provider::{Provider, ProviderFn, ProviderKind};
use crate::scope::Scope;
use crate::utils::dependency::{validate_dependency_graph, CreationTracker};

/// 依赖注入注册表
#[derive(Default)]
pub struct InjectorRegistry {
    providers: RwLock<HashMap<TypeKey, Provider>>,
    creation_tracker: CreationTracker<TypeKey>,
}

impl InjectorRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 provider，同一类型只能注册一次
    ///
    /// 失败时注册表保持原样。
    pub fn register(&self, key: TypeKey, provider: Provider) -> ContainerResult<()> {
        tracing::trace!(
            "Attempting to register provider: type='{}', kind={:?}",
            key,
            provider.kind()
        );

        let mut providers = self.providers.write();
        match providers.entry(key) {
            Entry::Occupied(_) => {
                tracing::warn!("Provider for '{}' already exists, registration failed", key);
                Err(ContainerError::DuplicateRegistration(key.name().to_string()))
            }
            Entry::Vacant(slot) => {
                tracing::debug!("Provider registered successfully: '{}' ({:?})", key, provider.kind());
                slot.insert(provider);
                Ok(())
            }
        }
    }

    /// 绑定固定实例，之后每次 `lookup::<T>()` 都返回同一个 `Arc`
    pub fn register_instance<T>(&self, instance: Arc<T>) -> ContainerResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(TypeKey::of::<T>(), Provider::instance(instance))
    }

    /// 绑定任意零参工厂
    ///
    /// 工厂每次 `lookup` 都会被调用；需要缓存时由工厂自行处理。
    pub fn register_provider<T, F>(&self, factory: F) -> ContainerResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.register(TypeKey::of::<T>(), Provider::custom(move |_| factory()))
    }

    /// 绑定可以查找其他依赖的工厂
    pub fn register_factory<T, F>(&self, factory: F) -> ContainerResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> ContainerResult<Arc<T>> + Send + Sync + 'static,
    {
        self.register(TypeKey::of::<T>(), Provider::custom(factory))
    }

    /// 把类型 `T` 绑定到实现类 `C` 的构造配方
    ///
    /// 配方在注册时生成，构造函数歧义或缺少无参构造函数会在这里立即失败。
    /// 每次 `lookup` 都会构造新的实例。
    pub fn register_provider_class<T, C, U>(&self, upcast: U) -> ContainerResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        C: Introspect,
        U: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        self.register_provider_class_scoped(Scope::Prototype, upcast)
    }

    /// 同 [`register_provider_class`](Self::register_provider_class)，显式指定作用域
    pub fn register_provider_class_scoped<T, C, U>(&self, scope: Scope, upcast: U) -> ContainerResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
        C: Introspect,
        U: Fn(Arc<C>) -> Arc<T> + Send + Sync + 'static,
    {
        let recipe = ConstructionRecipe::plan(&C::describe())?;
        self.register(TypeKey::of::<T>(), Provider::class(recipe, scope, upcast))
    }

    /// 把实现类绑定到它自身
    pub fn register_class<C: Introspect>(&self) -> ContainerResult<()> {
        self.register_provider_class::<C, C, _>(|bean| bean)
    }

    /// 查找类型 `T` 的实例
    pub fn lookup<T>(&self) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Resolver::new(self).lookup::<T>()
    }

    /// 是否已注册类型 `T`
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.providers.read().contains_key(&TypeKey::of::<T>())
    }

    /// 类型 `T` 的 provider 来源
    pub fn provider_kind<T: ?Sized + 'static>(&self) -> Option<ProviderKind> {
        self.providers.read().get(&TypeKey::of::<T>()).map(Provider::kind)
    }

    /// 所有已注册的类型
    pub fn registered_types(&self) -> Vec<TypeKey> {
        self.providers.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().is_empty()
    }

    /// 校验类提供者的静态依赖图
    ///
    /// 检查：
    /// - 缺失的依赖（配方需要的类型没有注册）
    /// - 循环依赖（A -> B -> C -> A）
    ///
    /// 自定义工厂的依赖在运行时才知道，不参与校验。
    pub fn validate(&self) -> ContainerResult<()> {
        let graph: HashMap<TypeKey, Vec<TypeKey>> = self
            .providers
            .read()
            .iter()
            .map(|(key, provider)| (*key, provider.dependencies().to_vec()))
            .collect();

        validate_dependency_graph(&graph)
            .map_err(|e| ContainerError::DependencyValidationFailed(e.to_string()))?;

        tracing::info!("Dependency validation passed for {} provider(s)", graph.len());
        Ok(())
    }

    fn factory_for(&self, key: TypeKey) -> Option<ProviderFn> {
        self.providers.read().get(&key).map(Provider::factory)
    }
}

/// 解析上下文
///
/// 正在构造的类型按线程记录在注册表中。同一线程上的嵌套查找，无论经由
/// `Resolver` 还是直接调用 [`InjectorRegistry::lookup`]，都会在进入 provider
/// 之前发现循环依赖。注册表的锁不会在调用 provider 期间持有。
pub struct Resolver<'a> {
    registry: &'a InjectorRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a InjectorRegistry) -> Self {
        Self { registry }
    }

    /// 所属的注册表
    pub fn registry(&self) -> &'a InjectorRegistry {
        self.registry
    }

    /// 查找类型 `T` 的实例
    pub fn lookup<T>(&self) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve(TypeKey::of::<T>())?.downcast::<T>()
    }

    /// 按类型键解析擦除后的实例
    pub fn resolve(&self, key: TypeKey) -> ContainerResult<Instance> {
        tracing::trace!("Requesting instance of '{}'", key);

        let tracker = &self.registry.creation_tracker;
        if tracker.is_creating(&key) {
            return Err(circular(tracker.current_creating(), key));
        }

        let factory = self.registry.factory_for(key).ok_or_else(|| {
            tracing::debug!("No provider registered for '{}'", key);
            ContainerError::UnresolvedDependency(key.name().to_string())
        })?;

        tracker.start_creating(key).map_err(|mut cycle| {
            cycle.pop();
            circular(cycle, key)
        })?;

        // 无论成功还是失败都要结束记录
        struct CreationGuard<'t> {
            tracker: &'t CreationTracker<TypeKey>,
            key: TypeKey,
        }

        impl Drop for CreationGuard<'_> {
            fn drop(&mut self) {
                self.tracker.finish_creating(&self.key);
            }
        }

        let _guard = CreationGuard { tracker, key };
        factory(self)
    }
}

fn circular(creating: Vec<TypeKey>, key: TypeKey) -> ContainerError {
    let chain = creating
        .iter()
        .map(TypeKey::simple_name)
        .chain(std::iter::once(key.simple_name()))
        .collect::<Vec<_>>()
        .join(" -> ");
    tracing::error!("Circular dependency detected while resolving '{}': {}", key, chain);
    ContainerError::CircularDependency(chain)
}
