//! 类型内省模型
//!
//! Rust 没有运行时反射，因此参与注入或映射的类型需要实现 [`Introspect`]，
//! 描述自己的构造函数、属性以及附带的标记。注册表只消费这份描述，
//! 不假设它被缓存，每次注册都可以重新调用 `describe()`。
//!
//! # 示例
//!
//! ```
//! use std::sync::Arc;
//! use hydra_core::prelude::*;
//!
//! pub trait Engine: Send + Sync {}
//!
//! pub struct Car {
//!     engine: Arc<dyn Engine>,
//!     radio: Option<Arc<String>>,
//! }
//!
//! impl Introspect for Car {
//!     fn describe() -> TypeDescription<Self> {
//!         TypeDescription::new()
//!             .constructor(
//!                 ConstructorDescriptor::new(|args| {
//!                     Ok(Car { engine: args.next()?, radio: None })
//!                 })
//!                 .param::<dyn Engine>()
//!                 .inject(),
//!             )
//!             .property(
//!                 PropertyDescriptor::writable("radio", |car: &mut Car, radio: Arc<String>| {
//!                     car.radio = Some(radio);
//!                 })
//!                 .inject(),
//!             )
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::{ContainerError, ContainerResult};
use crate::instance::Instance;
use crate::key::TypeKey;
use crate::marker::{Inject, Marker};

/// 可内省的类型
pub trait Introspect: Sized + Send + Sync + 'static {
    /// 返回类型描述
    fn describe() -> TypeDescription<Self>;
}

/// 构造函数体
pub type ConstructorBody<C> = Arc<dyn Fn(&mut Arguments) -> anyhow::Result<C> + Send + Sync>;

/// 属性读取器
pub type Reader<C> = Arc<dyn Fn(&C) -> serde_json::Value + Send + Sync>;

/// 属性写入器
pub type Writer<C> = Arc<dyn Fn(&mut C, Instance) -> anyhow::Result<()> + Send + Sync>;

/// 已解析的构造参数，按构造函数签名的顺序依次取出
pub struct Arguments {
    owner: &'static str,
    position: usize,
    values: VecDeque<Instance>,
}

impl Arguments {
    pub fn new(owner: &'static str, values: Vec<Instance>) -> Self {
        Self {
            owner,
            position: 0,
            values: values.into(),
        }
    }

    /// 取出下一个参数
    pub fn next<T: ?Sized + Send + Sync + 'static>(&mut self) -> ContainerResult<Arc<T>> {
        let index = self.position;
        let value = self.values.pop_front().ok_or_else(|| ContainerError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: format!("no argument #{} for '{}'", index, self.owner),
        })?;
        self.position += 1;
        value.downcast()
    }

    /// 剩余参数数量
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// 构造函数描述
pub struct ConstructorDescriptor<C> {
    markers: Vec<Marker>,
    parameter_types: Vec<TypeKey>,
    body: ConstructorBody<C>,
}

impl<C> ConstructorDescriptor<C> {
    /// 创建构造函数描述，参数类型通过 [`param`](Self::param) 依次声明
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&mut Arguments) -> anyhow::Result<C> + Send + Sync + 'static,
    {
        Self {
            markers: Vec::new(),
            parameter_types: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// 声明下一个参数的类型
    pub fn param<T: ?Sized + 'static>(mut self) -> Self {
        self.parameter_types.push(TypeKey::of::<T>());
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// 标记为注入构造函数
    pub fn inject(self) -> Self {
        self.marker(Marker::inject())
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn parameter_types(&self) -> &[TypeKey] {
        &self.parameter_types
    }

    pub fn is_injectable(&self) -> bool {
        self.markers.iter().any(Marker::is::<Inject>)
    }

    /// 无参构造函数
    pub fn is_parameterless(&self) -> bool {
        self.parameter_types.is_empty()
    }

    /// 用已解析的参数调用构造函数体
    pub fn construct(&self, arguments: &mut Arguments) -> anyhow::Result<C> {
        (self.body)(arguments)
    }
}

impl<C> Clone for ConstructorDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            markers: self.markers.clone(),
            parameter_types: self.parameter_types.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<C> fmt::Debug for ConstructorDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("markers", &self.markers)
            .field("parameter_types", &self.parameter_types)
            .finish()
    }
}

/// 属性描述
pub struct PropertyDescriptor<C> {
    name: &'static str,
    declared_type: TypeKey,
    markers: Vec<Marker>,
    reader: Option<Reader<C>>,
    writer: Option<Writer<C>>,
}

impl<C: 'static> PropertyDescriptor<C> {
    /// 只读属性
    pub fn read_only<T, F>(name: &'static str, reader: F) -> Self
    where
        T: ?Sized + 'static,
        F: Fn(&C) -> serde_json::Value + Send + Sync + 'static,
    {
        Self {
            name,
            declared_type: TypeKey::of::<T>(),
            markers: Vec::new(),
            reader: Some(Arc::new(reader)),
            writer: None,
        }
    }

    /// 可写属性，声明类型由写入器的参数类型决定
    pub fn writable<T, F>(name: &'static str, writer: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut C, Arc<T>) + Send + Sync + 'static,
    {
        let writer: Writer<C> = Arc::new(move |bean: &mut C, value: Instance| {
            writer(bean, value.downcast::<T>()?);
            Ok(())
        });
        Self {
            name,
            declared_type: TypeKey::of::<T>(),
            markers: Vec::new(),
            reader: None,
            writer: Some(writer),
        }
    }

    /// 为可写属性补充读取器
    pub fn with_reader<F>(mut self, reader: F) -> Self
    where
        F: Fn(&C) -> serde_json::Value + Send + Sync + 'static,
    {
        self.reader = Some(Arc::new(reader));
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// 标记为注入属性
    pub fn inject(self) -> Self {
        self.marker(Marker::inject())
    }
}

impl<C> PropertyDescriptor<C> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared_type(&self) -> TypeKey {
        self.declared_type
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn has_reader(&self) -> bool {
        self.reader.is_some()
    }

    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    pub fn reader(&self) -> Option<&Reader<C>> {
        self.reader.as_ref()
    }

    pub fn writer(&self) -> Option<&Writer<C>> {
        self.writer.as_ref()
    }

    /// 读取属性值
    pub fn read(&self, bean: &C) -> Option<serde_json::Value> {
        self.reader.as_ref().map(|reader| reader(bean))
    }

    /// 写入属性值
    pub fn write(&self, bean: &mut C, value: Instance) -> anyhow::Result<()> {
        match &self.writer {
            Some(writer) => writer(bean, value),
            None => Err(anyhow::anyhow!("property '{}' is read-only", self.name)),
        }
    }
}

impl<C> Clone for PropertyDescriptor<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            declared_type: self.declared_type,
            markers: self.markers.clone(),
            reader: self.reader.clone(),
            writer: self.writer.clone(),
        }
    }
}

impl<C> fmt::Debug for PropertyDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("markers", &self.markers)
            .field("has_reader", &self.has_reader())
            .field("has_writer", &self.has_writer())
            .finish()
    }
}

/// 类型描述
pub struct TypeDescription<C> {
    key: TypeKey,
    markers: Vec<Marker>,
    constructors: Vec<ConstructorDescriptor<C>>,
    properties: Vec<PropertyDescriptor<C>>,
}

impl<C: 'static> TypeDescription<C> {
    pub fn new() -> Self {
        Self {
            key: TypeKey::of::<C>(),
            markers: Vec::new(),
            constructors: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// 类型级别的标记
    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDescriptor<C>) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn property(mut self, property: PropertyDescriptor<C>) -> Self {
        self.properties.push(property);
        self
    }
}

impl<C: 'static> Default for TypeDescription<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TypeDescription<C> {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor<C>] {
        &self.constructors
    }

    /// 属性按描述顺序返回
    pub fn properties(&self) -> &[PropertyDescriptor<C>] {
        &self.properties
    }
}

impl<C> fmt::Debug for TypeDescription<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescription")
            .field("type", &self.key.name())
            .field("markers", &self.markers)
            .field("constructors", &self.constructors)
            .field("properties", &self.properties)
            .finish()
    }
}
