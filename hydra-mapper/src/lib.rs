//! Hydra Mapper - 基于类型描述的 JSON 输出
//!
//! 读取 [`Introspect`] 描述中带读取器的属性，按描述顺序输出为 JSON 对象。
//! 每个类型的生成器只构建一次，按 `TypeId` 缓存。嵌套的可内省对象通过
//! [`bean_property`] 声明，同样经由输出器生成。
//!
//! ```
//! use hydra_core::prelude::*;
//! use hydra_mapper::{JsonProperty, JsonWriter};
//!
//! struct Book {
//!     title: String,
//!     pages: u32,
//! }
//!
//! impl Introspect for Book {
//!     fn describe() -> TypeDescription<Self> {
//!         TypeDescription::new()
//!             .property(PropertyDescriptor::read_only::<String, _>("title", |b: &Book| b.title.clone().into()))
//!             .property(
//!                 PropertyDescriptor::read_only::<u32, _>("pages", |b: &Book| b.pages.into())
//!                     .marker(JsonProperty::rename("page-count")),
//!             )
//!     }
//! }
//!
//! let writer = JsonWriter::new();
//! let book = Book { title: "Dune".into(), pages: 412 };
//! assert_eq!(writer.to_json(&book), r#"{"title": "Dune", "page-count": 412}"#);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use hydra_core::introspection::Reader;
use hydra_core::{find_marker, Introspect, Marker, PropertyDescriptor};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// 内省时总是被排除的元属性
const CLASS_PROPERTY: &str = "class";

/// 嵌套对象使用的共享输出器
static SHARED: Lazy<JsonWriter> = Lazy::new(JsonWriter::new);

/// JSON 属性标记，附带的值是输出时使用的键名
pub struct JsonProperty;

impl JsonProperty {
    /// 以 `name` 作为输出键名
    pub fn rename(name: &'static str) -> Marker {
        Marker::of::<JsonProperty>().with_value(name)
    }
}

/// 单个属性的生成器：输出键名、`"key": ` 前缀和读取器
struct Generator<C> {
    name: String,
    prefix: String,
    reader: Reader<C>,
}

type Generators<C> = Arc<Vec<Generator<C>>>;

/// JSON 输出器
#[derive(Default)]
pub struct JsonWriter {
    generators: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程内共享的输出器，[`bean_property`] 用它输出嵌套对象
    pub fn shared() -> &'static JsonWriter {
        &SHARED
    }

    /// 把对象输出为 JSON 对象字符串
    pub fn to_json<C: Introspect>(&self, bean: &C) -> String {
        let generators = self.generators_for::<C>();
        let fields: Vec<String> = generators
            .iter()
            .map(|generator| {
                format!("{}{}", generator.prefix, value_to_json(&(generator.reader)(bean)))
            })
            .collect();
        format!("{{{}}}", fields.join(", "))
    }

    /// 把对象转换为按描述顺序排列的 JSON 对象
    pub fn to_value<C: Introspect>(&self, bean: &C) -> Value {
        let generators = self.generators_for::<C>();
        let fields: Map<String, Value> = generators
            .iter()
            .map(|generator| (generator.name.clone(), (generator.reader)(bean)))
            .collect();
        Value::Object(fields)
    }

    /// 已缓存生成器的类型数量
    pub fn cached_types(&self) -> usize {
        self.generators.read().len()
    }

    fn generators_for<C: Introspect>(&self) -> Generators<C> {
        let type_id = TypeId::of::<C>();
        if let Some(cached) = self.generators.read().get(&type_id) {
            if let Ok(generators) = Arc::clone(cached).downcast::<Vec<Generator<C>>>() {
                return generators;
            }
        }

        let generators = Arc::new(build_generators::<C>());
        tracing::debug!(
            "Built {} JSON generator(s) for '{}'",
            generators.len(),
            std::any::type_name::<C>()
        );

        let erased: Arc<dyn Any + Send + Sync> = generators.clone();
        self.generators.write().entry(type_id).or_insert(erased);
        generators
    }
}

fn build_generators<C: Introspect>() -> Vec<Generator<C>> {
    C::describe()
        .properties()
        .iter()
        .filter(|property| property.name() != CLASS_PROPERTY)
        .filter_map(|property| {
            let reader = property.reader()?;
            let name = find_marker::<JsonProperty>(property.markers())
                .and_then(Marker::value)
                .unwrap_or(property.name());
            Some(Generator {
                name: name.to_string(),
                prefix: format!("{}: ", Value::from(name)),
                reader: Arc::clone(reader),
            })
        })
        .collect()
}

/// 只读属性，值是另一个可内省的对象
///
/// 嵌套对象经由 [`JsonWriter::shared`] 输出，同样遵守重命名、排除 `class`
/// 和生成器缓存；`get` 返回 `None` 时输出 `null`。
pub fn bean_property<C, N, F>(name: &'static str, get: F) -> PropertyDescriptor<C>
where
    C: 'static,
    N: Introspect,
    F: Fn(&C) -> Option<&N> + Send + Sync + 'static,
{
    PropertyDescriptor::read_only::<N, _>(name, move |bean: &C| {
        get(bean).map_or(Value::Null, |nested| JsonWriter::shared().to_value(nested))
    })
}

/// 把单个值输出为 JSON 文本，对象和数组使用 `", "` 与 `": "` 分隔
pub fn value_to_json(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_to_json).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(fields) => {
            let fields: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{}: {}", Value::from(key.as_str()), value_to_json(value)))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        scalar => scalar.to_string(),
    }
}
