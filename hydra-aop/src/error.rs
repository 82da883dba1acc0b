//! 代理调用错误
//!
//! 代理的失败通过 `anyhow::Error` 传播，调用方用 `downcast_ref::<ProxyError>()` 区分。

use thiserror::Error;

/// 代理错误
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 结构性方法（相等、哈希、字符串转换等）不能通过代理调用
    #[error("operation '{method}' is not supported on a proxy of '{interface}'")]
    UnsupportedOperation { interface: String, method: String },

    /// 接口中没有该方法
    #[error("interface '{interface}' has no method '{method}'")]
    UnknownMethod { interface: String, method: String },

    /// 参数缺失或类型不符
    #[error("argument #{index} should be '{expected}', found '{found}'")]
    ArgumentMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// 返回值不是调用方期望的类型
    #[error("method '{method}' did not return a '{expected}'")]
    ReturnTypeMismatch { method: String, expected: String },
}
