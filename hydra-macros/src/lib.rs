mod introspect_impl;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Introspect 派生宏
///
/// 为带命名字段的结构体生成 `hydra_core::Introspect` 实现。
///
/// 用法：
/// ```ignore
/// #[derive(Introspect)]
/// #[introspect(marker = Marker::of::<Audited>())]  // 可选：类型级标记，可重复
/// #[introspect(no_constructor)]                     // 可选：不生成构造函数
/// struct UserService {
///     #[inject]
///     repository: Arc<dyn UserRepository>,   // 构造函数参数，按字段顺序
///     #[inject]
///     banner: Option<Arc<Banner>>,           // 注入属性，构造后写入
///     #[property]
///     name: String,                          // 只读属性，经 serde 输出
///     #[property(marker = JsonProperty::rename("max-size"))]
///     max_size: usize,
///     hits: AtomicUsize,                     // 其余字段使用 Default
/// }
/// ```
///
/// 有 `Arc<T>` 注入字段时生成带注入标记的构造函数，否则生成无参构造函数。
/// `#[property]` 字段的类型需要实现 `serde::Serialize`。
#[proc_macro_derive(Introspect, attributes(introspect, inject, property))]
pub fn derive_introspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    introspect_impl::derive_introspect_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
