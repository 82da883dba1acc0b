//! 拦截器与环绕通知
//!
//! [`Interceptor`] 是链中的一环：它拿到调用三元组和"继续执行"的剩余链，
//! 可以在前后做事、替换参数之外的结果，或者完全不调用剩余链。
//! [`AroundAdvice`] 是更简单的 before/after 形状，通过 [`AroundInterceptor`]
//! 适配为拦截器。

use std::fmt;

use crate::invocation::{Arguments, Invocation, InvocationResult, Target, Value};
use crate::method::Method;

/// 拦截器
pub trait Interceptor: Send + Sync {
    /// 拦截一次调用，`proceed` 是链的剩余部分
    fn intercept(
        &self,
        target: &Target,
        method: &Method,
        args: &Arguments,
        proceed: &Invocation,
    ) -> InvocationResult;

    /// 拦截器名称，用于日志
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Interceptor for F
where
    F: Fn(&Target, &Method, &Arguments, &Invocation) -> InvocationResult + Send + Sync,
{
    fn intercept(
        &self,
        target: &Target,
        method: &Method,
        args: &Arguments,
        proceed: &Invocation,
    ) -> InvocationResult {
        self(target, method, args, proceed)
    }
}

/// 从闭包创建拦截器，闭包的参数类型由这里推导
pub fn interceptor_fn<F>(f: F) -> F
where
    F: Fn(&Target, &Method, &Arguments, &Invocation) -> InvocationResult + Send + Sync,
{
    f
}

/// 被包装调用的结局，交给 [`AroundAdvice::after`]
pub enum Outcome<'a> {
    /// 正常返回
    Returned(&'a Value),
    /// 返回了错误，错误会在 `after` 之后继续传播
    Failed(&'a anyhow::Error),
    /// 调用过程中发生 panic，`after` 在栈展开时执行
    Panicked,
}

impl Outcome<'_> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Returned(_))
    }
}

impl fmt::Debug for Outcome<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Returned(_) => f.write_str("Returned"),
            Outcome::Failed(error) => write!(f, "Failed({})", error),
            Outcome::Panicked => f.write_str("Panicked"),
        }
    }
}

/// 环绕通知
///
/// `before` 和 `after` 都只产生副作用；`after` 无论调用成功、失败还是 panic 都会执行，
/// 且不会改变结果。
pub trait AroundAdvice: Send + Sync {
    /// 前置通知（可选实现）
    fn before(&self, _target: &Target, _method: &Method, _args: &Arguments) {}

    /// 后置通知（可选实现）
    fn after(&self, _target: &Target, _method: &Method, _args: &Arguments, _outcome: Outcome<'_>) {}
}

/// 把 [`AroundAdvice`] 适配为 [`Interceptor`]
pub struct AroundInterceptor<A> {
    advice: A,
}

impl<A: AroundAdvice> AroundInterceptor<A> {
    pub fn new(advice: A) -> Self {
        Self { advice }
    }
}

/// panic 展开时补上 `after`
struct AfterGuard<'a, A: AroundAdvice> {
    advice: &'a A,
    target: &'a Target,
    method: &'a Method,
    args: &'a Arguments,
    armed: bool,
}

impl<A: AroundAdvice> Drop for AfterGuard<'_, A> {
    fn drop(&mut self) {
        if self.armed {
            self.advice
                .after(self.target, self.method, self.args, Outcome::Panicked);
        }
    }
}

impl<A: AroundAdvice> Interceptor for AroundInterceptor<A> {
    fn intercept(
        &self,
        target: &Target,
        method: &Method,
        args: &Arguments,
        proceed: &Invocation,
    ) -> InvocationResult {
        self.advice.before(target, method, args);

        let mut guard = AfterGuard {
            advice: &self.advice,
            target,
            method,
            args,
            armed: true,
        };
        let result = proceed(target, method, args);
        guard.armed = false;

        let outcome = match &result {
            Ok(value) => Outcome::Returned(value),
            Err(error) => Outcome::Failed(error),
        };
        self.advice.after(target, method, args, outcome);
        result
    }

    fn name(&self) -> &str {
        std::any::type_name::<A>()
    }
}
