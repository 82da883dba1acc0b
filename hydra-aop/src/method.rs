//! 方法描述
//!
//! 每个可被代理的方法都有一个 [`Method`]：它的身份（声明类型 + 名称）、
//! 声明类型 / 方法本身 / 各参数上的标记，以及直接调用目标对象的终端调用。

use std::fmt;
use std::sync::Arc;

use hydra_core::{Marker, TypeKey};

use crate::invocation::{Arguments, Invocation, InvocationResult, Target};

/// 方法身份，编译后的拦截器链以它为键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId {
    declaring: TypeKey,
    name: &'static str,
}

impl MethodId {
    pub fn declaring(&self) -> TypeKey {
        self.declaring
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring.simple_name(), self.name)
    }
}

/// 参数描述
#[derive(Debug, Clone)]
pub struct Parameter {
    declared_type: TypeKey,
    markers: Vec<Marker>,
}

impl Parameter {
    pub fn declared_type(&self) -> TypeKey {
        self.declared_type
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }
}

/// 方法描述
#[derive(Clone)]
pub struct Method {
    id: MethodId,
    declaring_markers: Vec<Marker>,
    markers: Vec<Marker>,
    parameters: Vec<Parameter>,
    terminal: Invocation,
}

impl Method {
    /// 开始描述声明在 `T` 上的方法
    ///
    /// `body` 是对真实目标的直接调用，例如
    /// `Method::builder::<dyn Greeter, _>("greet", |greeter, args| returning(greeter.greet(args.get(0)?)))`。
    pub fn builder<T, F>(name: &'static str, body: F) -> MethodBuilder
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&T, &Arguments) -> InvocationResult + Send + Sync + 'static,
    {
        let declaring = TypeKey::of::<T>();
        let terminal: Invocation = Arc::new(move |target: &Target, method: &Method, args: &Arguments| {
            let receiver = target.downcast_ref::<T>().ok_or_else(|| {
                anyhow::anyhow!(
                    "target '{}' cannot receive calls to '{}'",
                    target.type_name(),
                    method.id()
                )
            })?;
            body(receiver, args)
        });

        MethodBuilder {
            method: Method {
                id: MethodId { declaring, name },
                declaring_markers: Vec::new(),
                markers: Vec::new(),
                parameters: Vec::new(),
                terminal,
            },
        }
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name
    }

    pub fn declaring_type(&self) -> TypeKey {
        self.id.declaring
    }

    /// 声明类型上的标记
    pub fn declaring_markers(&self) -> &[Marker] {
        &self.declaring_markers
    }

    /// 方法本身的标记
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// 直接调用目标对象，不经过任何拦截器
    pub fn terminal(&self) -> Invocation {
        Arc::clone(&self.terminal)
    }

    pub(crate) fn with_declaring_markers(mut self, markers: &[Marker]) -> Self {
        self.declaring_markers = markers.to_vec();
        self
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("id", &self.id.to_string())
            .field("declaring_markers", &self.declaring_markers)
            .field("markers", &self.markers)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// [`Method`] 构建器
pub struct MethodBuilder {
    method: Method,
}

impl MethodBuilder {
    /// 方法标记
    pub fn marker(mut self, marker: Marker) -> Self {
        self.method.markers.push(marker);
        self
    }

    /// 声明下一个参数
    pub fn param<P: ?Sized + 'static>(mut self) -> Self {
        self.method.parameters.push(Parameter {
            declared_type: TypeKey::of::<P>(),
            markers: Vec::new(),
        });
        self
    }

    /// 给最近声明的参数加标记
    pub fn param_marker(mut self, marker: Marker) -> Self {
        if let Some(parameter) = self.method.parameters.last_mut() {
            parameter.markers.push(marker);
        } else {
            tracing::warn!(
                "Ignoring parameter marker {:?} on '{}': no parameter declared yet",
                marker,
                self.method.id
            );
        }
        self
    }

    pub fn build(self) -> Method {
        self.method
    }
}
