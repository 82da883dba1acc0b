//! 构造计划
//!
//! 给定一个具体类型的描述，选出唯一的注入构造函数和需要注入的属性，
//! 得到一份可以反复执行的构造配方。

use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, ContainerResult};
use crate::instance::Instance;
use crate::introspection::{Arguments, ConstructorDescriptor, PropertyDescriptor, TypeDescription};
use crate::key::TypeKey;
use crate::marker::Inject;
use crate::registry::Resolver;

/// 内省时总是被排除的元属性
const CLASS_PROPERTY: &str = "class";

/// 构造配方
pub struct ConstructionRecipe<C> {
    key: TypeKey,
    constructor: ConstructorDescriptor<C>,
    properties: Vec<PropertyDescriptor<C>>,
}

impl<C: Send + Sync + 'static> ConstructionRecipe<C> {
    /// 根据类型描述生成配方
    ///
    /// 构造函数的选择规则：
    /// - 没有带注入标记的构造函数：使用无参构造函数，不存在则返回 `NoDefaultConstructor`
    /// - 恰好一个：使用它
    /// - 多于一个：返回 `AmbiguousConstructor`
    pub fn plan(description: &TypeDescription<C>) -> ContainerResult<Self> {
        let key = description.key();
        let constructor = find_injectable_constructor(description)?.clone();
        let properties = find_injectable_properties(description);

        tracing::trace!(
            "Planned construction of '{}': {} parameter(s), {} injectable propert(ies)",
            key,
            constructor.parameter_types().len(),
            properties.len()
        );

        Ok(Self {
            key,
            constructor,
            properties,
        })
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// 构造函数的参数类型（按签名顺序）
    pub fn parameter_types(&self) -> &[TypeKey] {
        self.constructor.parameter_types()
    }

    /// 需要注入的属性（按描述顺序）
    pub fn injectable_properties(&self) -> &[PropertyDescriptor<C>] {
        &self.properties
    }

    /// 配方依赖的全部类型：先构造参数，再属性
    pub fn dependencies(&self) -> Vec<TypeKey> {
        self.parameter_types()
            .iter()
            .copied()
            .chain(self.properties.iter().map(PropertyDescriptor::declared_type))
            .collect()
    }

    /// 执行配方
    ///
    /// 1. 依次解析构造参数
    /// 2. 调用构造函数
    /// 3. 按描述顺序解析并写入注入属性
    ///
    /// 解析依赖时产生的容器错误原样向上传播。
    pub fn execute(&self, resolver: &Resolver<'_>) -> ContainerResult<Arc<C>> {
        let type_name = self.key.name();

        let values = self
            .parameter_types()
            .iter()
            .map(|parameter| resolver.resolve(*parameter))
            .collect::<ContainerResult<Vec<Instance>>>()?;

        let mut arguments = Arguments::new(type_name, values);
        let mut bean = self
            .constructor
            .construct(&mut arguments)
            .map_err(|e| ContainerError::construction(type_name, e))?;

        for property in &self.properties {
            let value = resolver.resolve(property.declared_type())?;
            property
                .write(&mut bean, value)
                .map_err(|e| ContainerError::construction(type_name, e))?;
            tracing::trace!("Injected property '{}' of '{}'", property.name(), type_name);
        }

        Ok(Arc::new(bean))
    }
}

impl<C> fmt::Debug for ConstructionRecipe<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionRecipe")
            .field("type", &self.key.name())
            .field("constructor", &self.constructor)
            .field("properties", &self.properties)
            .finish()
    }
}

fn find_injectable_constructor<C>(
    description: &TypeDescription<C>,
) -> ContainerResult<&ConstructorDescriptor<C>> {
    let marked: Vec<_> = description
        .constructors()
        .iter()
        .filter(|constructor| constructor.is_injectable())
        .collect();

    match marked.as_slice() {
        [] => description
            .constructors()
            .iter()
            .find(|constructor| constructor.is_parameterless())
            .ok_or_else(|| ContainerError::NoDefaultConstructor(description.key().name().to_string())),
        [constructor] => Ok(*constructor),
        _ => Err(ContainerError::AmbiguousConstructor {
            type_name: description.key().name().to_string(),
            count: marked.len(),
        }),
    }
}

fn find_injectable_properties<C>(description: &TypeDescription<C>) -> Vec<PropertyDescriptor<C>> {
    description
        .properties()
        .iter()
        .filter(|property| property.name() != CLASS_PROPERTY)
        .filter(|property| property.has_writer())
        .filter(|property| property.markers().iter().any(|m| m.is::<Inject>()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::Introspect;

    struct Widget;

    fn widget() -> anyhow::Result<Widget> {
        Ok(Widget)
    }

    #[test]
    fn test_no_marked_constructor_uses_parameterless() {
        let description = TypeDescription::<Widget>::new()
            .constructor(ConstructorDescriptor::new(|_| widget()).param::<String>())
            .constructor(ConstructorDescriptor::new(|_| widget()));
        let recipe = ConstructionRecipe::plan(&description).unwrap();
        assert!(recipe.parameter_types().is_empty());
    }

    #[test]
    fn test_single_marked_constructor_wins() {
        let description = TypeDescription::<Widget>::new()
            .constructor(ConstructorDescriptor::new(|_| widget()))
            .constructor(ConstructorDescriptor::new(|_| widget()).param::<String>().inject());
        let recipe = ConstructionRecipe::plan(&description).unwrap();
        assert_eq!(recipe.parameter_types(), &[TypeKey::of::<String>()]);
    }

    #[test]
    fn test_two_marked_constructors_are_ambiguous() {
        let description = TypeDescription::<Widget>::new()
            .constructor(ConstructorDescriptor::new(|_| widget()).inject())
            .constructor(ConstructorDescriptor::new(|_| widget()).param::<u8>().inject());
        let error = ConstructionRecipe::plan(&description).unwrap_err();
        assert!(matches!(error, ContainerError::AmbiguousConstructor { count: 2, .. }));
    }

    #[test]
    fn test_missing_default_constructor() {
        let description = TypeDescription::<Widget>::new()
            .constructor(ConstructorDescriptor::new(|_| widget()).param::<u8>());
        let error = ConstructionRecipe::plan(&description).unwrap_err();
        assert!(matches!(error, ContainerError::NoDefaultConstructor(_)));
    }

    struct Panel {
        title: Option<Arc<String>>,
    }

    impl Introspect for Panel {
        fn describe() -> TypeDescription<Self> {
            let set_title = |p: &mut Panel, t: Arc<String>| p.title = Some(t);
            TypeDescription::new()
                .constructor(ConstructorDescriptor::new(|_| Ok(Panel { title: None })))
                .property(PropertyDescriptor::read_only::<String, _>("name", |_: &Panel| "panel".into()))
                .property(PropertyDescriptor::writable("unmarked", set_title))
                .property(PropertyDescriptor::writable("class", set_title).inject())
                .property(PropertyDescriptor::writable("title", set_title).inject())
                .property(
                    PropertyDescriptor::read_only::<u32, _>("width", |_: &Panel| 0.into()).inject(),
                )
        }
    }

    #[test]
    fn test_injectable_properties_filtering() {
        let recipe = ConstructionRecipe::plan(&Panel::describe()).unwrap();
        let names: Vec<_> = recipe.injectable_properties().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["title"]);
        assert_eq!(recipe.dependencies(), vec![TypeKey::of::<String>()]);
    }
}
