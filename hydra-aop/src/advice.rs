//! 预定义的常用通知

use std::time::{Duration, Instant};

use crate::error_info::ErrorInfo;
use crate::interceptor::{AroundAdvice, Interceptor, Outcome};
use crate::invocation::{Arguments, Invocation, InvocationResult, Target};
use crate::method::Method;

/// 日志通知 - 记录方法调用
#[derive(Debug, Clone, Default)]
pub struct LoggingAdvice {
    log_args: bool,
}

impl LoggingAdvice {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同时记录参数类型
    pub fn with_args(mut self) -> Self {
        self.log_args = true;
        self
    }
}

impl AroundAdvice for LoggingAdvice {
    fn before(&self, _target: &Target, method: &Method, args: &Arguments) {
        if self.log_args {
            tracing::info!("→ Entering: {} with {:?}", method.id(), args);
        } else {
            tracing::info!("→ Entering: {}", method.id());
        }
    }

    fn after(&self, _target: &Target, method: &Method, _args: &Arguments, outcome: Outcome<'_>) {
        match outcome {
            Outcome::Returned(_) => tracing::info!("← Exiting: {}", method.id()),
            Outcome::Failed(error) => tracing::error!(
                "❌ Failure in {}: {}",
                method.id(),
                ErrorInfo::from_anyhow(error).full_description()
            ),
            Outcome::Panicked => tracing::error!("❌ Panic in {}", method.id()),
        }
    }
}

/// 性能监控通知 - 调用耗时超过阈值时告警
#[derive(Debug, Clone)]
pub struct TimingAdvice {
    threshold: Duration,
}

impl TimingAdvice {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

impl Interceptor for TimingAdvice {
    fn intercept(
        &self,
        target: &Target,
        method: &Method,
        args: &Arguments,
        proceed: &Invocation,
    ) -> InvocationResult {
        let started = Instant::now();
        let result = proceed(target, method, args);
        let elapsed = started.elapsed();

        if elapsed > self.threshold {
            tracing::warn!(
                "⚠️ Slow method detected: {} took {:?} (threshold: {:?})",
                method.id(),
                elapsed,
                self.threshold
            );
        } else {
            tracing::trace!("{} took {:?}", method.id(), elapsed);
        }
        result
    }

    fn name(&self) -> &str {
        "TimingAdvice"
    }
}
