//! 拦截器注册表
//!
//! 负责管理 标记 -> 拦截器 的映射，为每个方法编译拦截器链并缓存。
//!
//! # 使用约定
//!
//! 拦截器应在启动阶段注册。任何一次注册都会清空整个链缓存；与注册并发的调用
//! 可能仍在使用注册之前编译的链，这是可以接受的窄窗口，而不是即时可见的保证。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use hydra_core::Marker;

use crate::interceptor::{AroundAdvice, AroundInterceptor, Interceptor};
use crate::interface::Interface;
use crate::invocation::{Arguments, Invocation, Target};
use crate::method::{Method, MethodId};
use crate::proxy::Proxy;

/// 拦截器注册表
#[derive(Default)]
pub struct InterceptorRegistry {
    interceptors: RwLock<HashMap<Marker, Vec<Arc<dyn Interceptor>>>>,
    chains: RwLock<HashMap<MethodId, Invocation>>,
    generation: AtomicU64,
    compilations: AtomicUsize,
}

impl InterceptorRegistry {
    /// 创建新的拦截器注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 为标记追加拦截器，并清空整个链缓存
    pub fn add_interceptor<I>(&self, marker: Marker, interceptor: I)
    where
        I: Interceptor + 'static,
    {
        self.add_shared_interceptor(marker, Arc::new(interceptor));
    }

    /// 同 [`add_interceptor`](Self::add_interceptor)，拦截器可以在多个标记间共享
    pub fn add_shared_interceptor(&self, marker: Marker, interceptor: Arc<dyn Interceptor>) {
        tracing::debug!(
            "Registering interceptor '{}' for marker {:?}",
            interceptor.name(),
            marker
        );

        {
            let mut interceptors = self.interceptors.write();
            interceptors.entry(marker).or_default().push(interceptor);
            self.generation.fetch_add(1, Ordering::SeqCst);
        }

        let mut chains = self.chains.write();
        if !chains.is_empty() {
            tracing::warn!(
                "Interceptor registered after {} chain(s) were compiled; clearing chain cache",
                chains.len()
            );
            chains.clear();
        }
    }

    /// 注册环绕通知
    pub fn add_around_advice<A>(&self, marker: Marker, advice: A)
    where
        A: AroundAdvice + 'static,
    {
        self.add_interceptor(marker, AroundInterceptor::new(advice));
    }

    /// 查找适用于方法的拦截器
    ///
    /// 依次收集声明类型、方法本身、各参数上的标记，去重后保留首次出现的位置，
    /// 再展开为各标记下注册的拦截器。
    pub fn find_interceptors(&self, method: &Method) -> Vec<Arc<dyn Interceptor>> {
        let mut markers: Vec<&Marker> = Vec::new();
        let candidates = method
            .declaring_markers()
            .iter()
            .chain(method.markers())
            .chain(method.parameters().iter().flat_map(|p| p.markers()));
        for marker in candidates {
            if !markers.contains(&marker) {
                markers.push(marker);
            }
        }

        let interceptors = self.interceptors.read();
        markers
            .into_iter()
            .filter_map(|marker| interceptors.get(marker))
            .flatten()
            .cloned()
            .collect()
    }

    /// 把拦截器折叠为一个调用
    ///
    /// 第一个拦截器在最外层，终端调用在最内层。
    pub fn compose(interceptors: Vec<Arc<dyn Interceptor>>, terminal: Invocation) -> Invocation {
        interceptors.into_iter().rev().fold(terminal, |next, interceptor| {
            let wrapped: Invocation =
                Arc::new(move |target: &Target, method: &Method, args: &Arguments| {
                    interceptor.intercept(target, method, args, &next)
                });
            wrapped
        })
    }

    /// 获取方法的拦截器链，缓存命中时不会重新编译
    pub fn invocation(&self, method: &Method) -> Invocation {
        let id = method.id();
        if let Some(chain) = self.chains.read().get(&id) {
            tracing::trace!("Chain cache hit for '{}'", id);
            return Arc::clone(chain);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let interceptors = self.find_interceptors(method);
        let count = interceptors.len();
        let chain = Self::compose(interceptors, method.terminal());
        self.compilations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Compiled chain for '{}' with {} interceptor(s)", id, count);

        self.cache_chain(id, generation, chain)
    }

    /// 缓存在 `generation` 时编译的链；期间拦截器有变化时只返回不缓存
    fn cache_chain(&self, id: MethodId, generation: u64, chain: Invocation) -> Invocation {
        let mut chains = self.chains.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(
                "Interceptors changed while compiling '{}'; chain used once without caching",
                id
            );
            return chain;
        }
        Arc::clone(chains.entry(id).or_insert(chain))
    }

    /// 为目标对象创建代理
    pub fn create_proxy<T>(self: &Arc<Self>, target: Arc<T>) -> Proxy<T>
    where
        T: ?Sized + Interface,
    {
        Proxy::new(Arc::clone(self), target)
    }

    /// 链编译的累计次数
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// 当前缓存的链数量
    pub fn cached_chains(&self) -> usize {
        self.chains.read().len()
    }

    /// 注册的拦截器总数
    pub fn interceptor_count(&self) -> usize {
        self.interceptors.read().values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{interceptor_fn, Outcome};
    use crate::interface::InterfaceDescription;
    use crate::method::MethodBuilder;
    use crate::invocation::{returning, InvocationResult};
    use parking_lot::Mutex;

    struct Log;
    struct Time;
    struct Audit;

    trait Calculator: Send + Sync {
        fn add(&self, a: i64, b: i64) -> i64;
    }

    struct Plain;

    impl Calculator for Plain {
        fn add(&self, a: i64, b: i64) -> i64 {
            a + b
        }
    }

    type Journal = Arc<Mutex<Vec<String>>>;

    /// 记录 before/after 的通知
    struct Note {
        label: &'static str,
        journal: Journal,
    }

    impl AroundAdvice for Note {
        fn before(&self, _: &Target, _: &Method, _: &Arguments) {
            self.journal.lock().push(format!("{}-before", self.label));
        }

        fn after(&self, _: &Target, _: &Method, _: &Arguments, _: Outcome<'_>) {
            self.journal.lock().push(format!("{}-after", self.label));
        }
    }

    fn add_method_builder(journal: &Journal) -> MethodBuilder {
        let journal = Arc::clone(journal);
        Method::builder::<dyn Calculator, _>("add", move |calc, args| {
            journal.lock().push("f".to_string());
            returning(calc.add(*args.get(0)?, *args.get(1)?))
        })
        .param::<i64>()
        .param::<i64>()
    }

    fn add_method(journal: &Journal) -> Method {
        add_method_builder(journal).build()
    }

    fn run(registry: &InterceptorRegistry, method: &Method) -> InvocationResult {
        let calc: Arc<dyn Calculator> = Arc::new(Plain);
        let chain = registry.invocation(method);
        chain(&Target::new(calc), method, &crate::args![2_i64, 3_i64])
    }

    fn sum(result: InvocationResult) -> i64 {
        *result.unwrap().downcast::<i64>().unwrap()
    }

    #[test]
    fn test_chain_order_follows_registration() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        let log = Marker::of::<Log>();
        registry.add_around_advice(log, Note { label: "Log", journal: Arc::clone(&journal) });
        registry.add_around_advice(log, Note { label: "Time", journal: Arc::clone(&journal) });

        let method = add_method_builder(&journal).marker(log).build();

        assert_eq!(sum(run(&registry, &method)), 5);
        assert_eq!(
            *journal.lock(),
            vec!["Log-before", "Time-before", "f", "Time-after", "Log-after"]
        );
    }

    #[test]
    fn test_markers_deduplicated_first_occurrence_wins() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        registry.add_around_advice(Marker::of::<Time>(), Note { label: "B", journal: Arc::clone(&journal) });
        registry.add_around_advice(Marker::of::<Log>(), Note { label: "A", journal: Arc::clone(&journal) });

        let description = InterfaceDescription::of::<dyn Calculator>()
            .marker(Marker::of::<Log>())
            .method(
                Method::builder::<dyn Calculator, _>("add", |calc, args| {
                    returning(calc.add(*args.get(0)?, *args.get(1)?))
                })
                .marker(Marker::of::<Time>())
                .param::<i64>()
                .param_marker(Marker::of::<Log>())
                .param::<i64>()
                .param_marker(Marker::of::<Audit>()),
            )
            .build();
        let method = description.method("add").unwrap();

        let found = registry.find_interceptors(method);
        assert_eq!(found.len(), 2);

        assert_eq!(sum(run(&registry, method)), 5);
        assert_eq!(*journal.lock(), vec!["A-before", "B-before", "B-after", "A-after"]);
    }

    #[test]
    fn test_chain_compiled_against_stale_generation_is_not_cached() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        let method = add_method(&journal);

        let generation = registry.generation.load(Ordering::SeqCst);
        let stale = InterceptorRegistry::compose(registry.find_interceptors(&method), method.terminal());
        registry.add_interceptor(
            Marker::of::<Audit>(),
            interceptor_fn(|target, method, args, proceed| proceed(target, method, args)),
        );

        let chain = registry.cache_chain(method.id(), generation, stale);
        assert_eq!(registry.cached_chains(), 0);

        let calc: Arc<dyn Calculator> = Arc::new(Plain);
        assert_eq!(sum(chain(&Target::new(calc), &method, &crate::args![2_i64, 3_i64])), 5);

        assert_eq!(sum(run(&registry, &method)), 5);
        assert_eq!(registry.cached_chains(), 1);
    }

    #[test]
    fn test_cache_hit_does_not_recompile() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        registry.add_around_advice(Marker::of::<Log>(), Note { label: "Log", journal: Arc::clone(&journal) });
        let method = add_method(&journal);

        assert_eq!(sum(run(&registry, &method)), 5);
        assert_eq!(sum(run(&registry, &method)), 5);
        assert_eq!(registry.compilations(), 1);
        assert_eq!(registry.cached_chains(), 1);
    }

    #[test]
    fn test_new_interceptor_invalidates_compiled_chains() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        let method = Method::builder::<dyn Calculator, _>("add", |calc, args| {
            returning(calc.add(*args.get(0)?, *args.get(1)?))
        })
        .marker(Marker::of::<Audit>())
        .build();

        assert_eq!(sum(run(&registry, &method)), 5);
        assert_eq!(registry.cached_chains(), 1);

        registry.add_interceptor(
            Marker::of::<Audit>(),
            interceptor_fn(|target, method, args, proceed| {
                let value = *proceed(target, method, args)?
                    .downcast::<i64>()
                    .map_err(|_| anyhow::anyhow!("expected i64"))?;
                returning(value * 10)
            }),
        );
        assert_eq!(registry.cached_chains(), 0);

        assert_eq!(sum(run(&registry, &method)), 50);
        assert_eq!(registry.compilations(), 2);
        assert!(journal.lock().is_empty());
    }

    #[test]
    fn test_empty_chain_is_direct_call() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        registry.add_around_advice(Marker::of::<Log>(), Note { label: "Log", journal: Arc::clone(&journal) });
        let method = add_method(&journal);

        assert!(registry.find_interceptors(&method).is_empty());
        assert_eq!(sum(run(&registry, &method)), 5);
        assert_eq!(*journal.lock(), vec!["f"]);
    }

    #[test]
    fn test_short_circuit_interceptor() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        registry.add_interceptor(
            Marker::of::<Audit>(),
            interceptor_fn(|_, _, _, _| returning(-1_i64)),
        );
        let tracked = Arc::clone(&journal);
        let method = Method::builder::<dyn Calculator, _>("add", move |calc, args| {
            tracked.lock().push("f".to_string());
            returning(calc.add(*args.get(0)?, *args.get(1)?))
        })
        .marker(Marker::of::<Audit>())
        .build();

        assert_eq!(sum(run(&registry, &method)), -1);
        assert!(journal.lock().is_empty());
        assert_eq!(registry.interceptor_count(), 1);
    }

    #[test]
    fn test_concurrent_calls_converge_on_one_chain() {
        let journal = Journal::default();
        let registry = InterceptorRegistry::new();
        registry.add_around_advice(Marker::of::<Log>(), Note { label: "Log", journal: Arc::clone(&journal) });
        let method = Method::builder::<dyn Calculator, _>("add", |calc, args| {
            returning(calc.add(*args.get(0)?, *args.get(1)?))
        })
        .marker(Marker::of::<Log>())
        .build();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..10 {
                        assert_eq!(sum(run(&registry, &method)), 5);
                    }
                });
            }
        });

        assert_eq!(registry.cached_chains(), 1);
        assert!(registry.compilations() >= 1 && registry.compilations() <= 8);
        assert_eq!(journal.lock().len(), 8 * 10 * 2);
    }
}
