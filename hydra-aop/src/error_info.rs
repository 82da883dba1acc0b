//! 错误信息结构
//!
//! 提供结构化的错误信息传递给通知

use std::error::Error;

/// 结构化的错误信息
///
/// 用于在日志通知中输出完整的原因链
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// 错误消息
    pub message: String,

    /// 错误源链（cause chain）
    pub source_chain: Vec<String>,
}

impl ErrorInfo {
    /// 从标准错误创建 ErrorInfo
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let mut source_chain = Vec::new();
        let mut current_source = error.source();
        while let Some(source) = current_source {
            source_chain.push(source.to_string());
            current_source = source.source();
        }

        Self {
            message: error.to_string(),
            source_chain,
        }
    }

    /// 从调用链中传播的 `anyhow::Error` 创建
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let mut chain = error.chain().map(ToString::to_string);
        Self {
            message: chain.next().unwrap_or_default(),
            source_chain: chain.collect(),
        }
    }

    /// 获取完整的错误描述（包含源链）
    pub fn full_description(&self) -> String {
        if self.source_chain.is_empty() {
            self.message.clone()
        } else {
            format!(
                "{}\nCaused by:\n  {}",
                self.message,
                self.source_chain.join("\n  ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_from_anyhow_keeps_chain() {
        let error = Err::<(), _>(anyhow::anyhow!("connection refused"))
            .context("loading user 7")
            .unwrap_err();

        let info = ErrorInfo::from_anyhow(&error);
        assert_eq!(info.message, "loading user 7");
        assert_eq!(info.source_chain, vec!["connection refused"]);
        assert_eq!(
            info.full_description(),
            "loading user 7\nCaused by:\n  connection refused"
        );
    }

    #[test]
    fn test_from_error_without_source() {
        let error = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let info = ErrorInfo::from_error(&error);
        assert_eq!(info.full_description(), "disk full");
    }
}
