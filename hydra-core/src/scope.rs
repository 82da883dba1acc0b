/// 类提供者的作用域
///
/// 类提供者默认每次 `lookup` 都重新构造（`Prototype`）；需要单例语义时在注册时
/// 显式选择 `Singleton`，实例在第一次构造后被该注册项缓存。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// 单例模式 - 首次构造后复用同一个实例
    Singleton,

    /// 原型模式 - 每次请求都创建新实例
    #[default]
    Prototype,
}
