use std::sync::Arc;
use std::time::Duration;

use hydra_aop::{
    args, returning, Interface, InterfaceDescription, InterceptorRegistry, LoggingAdvice, Method,
    Proxy, ProxyRegistration, TimingAdvice,
};
use hydra_core::{
    ContainerError, InjectorRegistry, Introspect, LoggingConfig, Marker, PropertyDescriptor,
    Scope, TypeDescription,
};
use hydra_macros::Introspect;
use hydra_mapper::{bean_property, JsonProperty, JsonWriter};
use once_cell::sync::Lazy;
use serde_json::json;

// ==================== 标记 ====================

/// 记录调用日志
struct Logged;

/// 监控调用耗时
struct Timed;

// ==================== 配置 ====================

struct AppSettings {
    name: String,
    owner_domain: String,
}

struct Banner(String);

// ==================== 数据模型 ====================

#[derive(Debug, Clone, Introspect)]
struct Address {
    #[property]
    city: String,
    #[property(marker = JsonProperty::rename("country"))]
    country_code: &'static str,
}

#[derive(Debug, Clone)]
struct User {
    id: u32,
    name: String,
    email: Option<String>,
    address: Option<Address>,
}

impl Introspect for User {
    fn describe() -> TypeDescription<Self> {
        TypeDescription::new()
            .property(PropertyDescriptor::read_only::<u32, _>("id", |u: &User| json!(u.id)))
            .property(
                PropertyDescriptor::read_only::<String, _>("name", |u: &User| json!(u.name))
                    .marker(JsonProperty::rename("display-name")),
            )
            .property(PropertyDescriptor::read_only::<String, _>("email", |u: &User| {
                json!(u.email)
            }))
            .property(bean_property("address", |u: &User| u.address.as_ref()))
    }
}

// ==================== 仓储层 ====================

trait UserRepository: Send + Sync {
    fn find(&self, id: u32) -> anyhow::Result<Option<User>>;
    fn count(&self) -> anyhow::Result<usize>;
}

#[derive(Introspect)]
struct InMemoryUserRepository {
    #[inject]
    settings: Arc<AppSettings>,
}

impl InMemoryUserRepository {
    const NAMES: [&'static str; 3] = ["alice", "bob", "carol"];
}

impl UserRepository for InMemoryUserRepository {
    fn find(&self, id: u32) -> anyhow::Result<Option<User>> {
        let user = Self::NAMES.get(id as usize).map(|name| User {
            id,
            name: name.to_string(),
            email: (id != 1).then(|| format!("{}@{}", name, self.settings.owner_domain)),
            address: (id == 0).then(|| Address {
                city: "Lyon".to_string(),
                country_code: "FR",
            }),
        });
        Ok(user)
    }

    fn count(&self) -> anyhow::Result<usize> {
        Ok(Self::NAMES.len())
    }
}

impl Interface for dyn UserRepository {
    fn description() -> Arc<InterfaceDescription> {
        static DESCRIPTION: Lazy<Arc<InterfaceDescription>> = Lazy::new(|| {
            Arc::new(
                InterfaceDescription::of::<dyn UserRepository>()
                    .marker(Marker::of::<Logged>())
                    .method(
                        Method::builder::<dyn UserRepository, _>("find", |repo, args| {
                            returning(repo.find(*args.get::<u32>(0)?)?)
                        })
                        .marker(Marker::of::<Timed>())
                        .param::<u32>(),
                    )
                    .method(Method::builder::<dyn UserRepository, _>("count", |repo, _| {
                        returning(repo.count()?)
                    }))
                    .build(),
            )
        });
        Arc::clone(&DESCRIPTION)
    }

    fn from_proxy(proxy: Proxy<Self>) -> Arc<Self> {
        Arc::new(proxy)
    }
}

impl UserRepository for Proxy<dyn UserRepository> {
    fn find(&self, id: u32) -> anyhow::Result<Option<User>> {
        self.call("find", args![id])
    }

    fn count(&self) -> anyhow::Result<usize> {
        self.call("count", args![])
    }
}

// ==================== 服务层 ====================

#[derive(Introspect)]
struct UserService {
    #[inject]
    repository: Arc<dyn UserRepository>,
    #[inject]
    banner: Option<Arc<Banner>>,
}

impl UserService {
    fn describe_user(&self, id: u32) -> anyhow::Result<Option<User>> {
        let user = self.repository.find(id)?;
        if let (Some(banner), Some(user)) = (&self.banner, &user) {
            tracing::info!("[{}] found user {}", banner.0, user.name);
        }
        Ok(user)
    }
}

// ==================== 启动 ====================

fn build_registry(interceptors: &Arc<InterceptorRegistry>) -> anyhow::Result<InjectorRegistry> {
    let registry = InjectorRegistry::new();

    registry.register_instance(Arc::new(AppSettings {
        name: "HydraDemo".to_string(),
        owner_domain: "example.com".to_string(),
    }))?;

    registry.register_factory::<Banner, _>(|resolver| {
        let settings = resolver.lookup::<AppSettings>()?;
        Ok(Arc::new(Banner(settings.name.clone())))
    })?;

    registry.register_proxied_class_scoped::<dyn UserRepository, InMemoryUserRepository, _>(
        interceptors,
        Scope::Singleton,
        |repo| repo as Arc<dyn UserRepository>,
    )?;

    registry.register_provider_class_scoped::<UserService, UserService, _>(
        Scope::Singleton,
        |service| service,
    )?;

    registry.validate()?;
    Ok(registry)
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = LoggingConfig::from_env().init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║          Hydra Framework - Complete Demo           ║");
    println!("╚════════════════════════════════════════════════════╝\n");

    let interceptors = Arc::new(InterceptorRegistry::new());
    interceptors.add_around_advice(Marker::of::<Logged>(), LoggingAdvice::new().with_args());
    interceptors.add_interceptor(Marker::of::<Timed>(), TimingAdvice::new(Duration::from_millis(5)));

    let registry = build_registry(&interceptors)?;
    tracing::info!("Registered {} binding(s)", registry.len());

    let service = registry.lookup::<UserService>()?;
    let writer = JsonWriter::new();

    for id in 0..4 {
        match service.describe_user(id)? {
            Some(user) => println!("  {}", writer.to_json(&user)),
            None => println!("  user {} not found", id),
        }
    }
    println!("  total users: {}", service.repository.count()?);
    println!(
        "  compiled chains: {} (compilations: {})",
        interceptors.cached_chains(),
        interceptors.compilations()
    );

    match registry.lookup::<String>() {
        Err(ContainerError::UnresolvedDependency(name)) => println!("  nothing bound for {}", name),
        Err(e) => println!("  unexpected error: {}", e),
        Ok(value) => println!("  unexpected binding: {}", value),
    }

    println!("\n✅ Demo finished");
    Ok(())
}
