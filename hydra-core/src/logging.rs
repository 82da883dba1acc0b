use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{ContainerError, ContainerResult};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 紧凑格式（默认）
    Compact,
    /// 完整格式（带时间、级别、目标）
    Full,
    /// JSON 格式
    Json,
    /// 美化格式（适合开发）
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "full" => Ok(LogFormat::Full),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// 日志配置
///
/// 可以用构建器方式创建，也可以从环境变量或 TOML 文件的 `[logging]` 表读取：
///
/// ```toml
/// [logging]
/// level = "debug"
/// format = "pretty"
/// show_target = true
/// filter = "hydra_aop=trace"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（默认：Info）
    pub level: LogLevel,

    /// 日志格式（默认：Compact）
    pub format: LogFormat,

    /// 是否显示目标（模块路径）（默认：false）
    pub show_target: bool,

    /// 是否显示线程 ID（默认：false）
    pub show_thread_ids: bool,

    /// 是否显示线程名（默认：false）
    pub show_thread_names: bool,

    /// 自定义过滤器（可选）
    /// 例如："hydra_core=debug,hydra_aop=warn"
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            show_target: false,
            show_thread_ids: false,
            show_thread_names: false,
            filter: None,
        }
    }
}

/// TOML 文件中只关心 `[logging]` 表
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    logging: LoggingConfig,
}

impl LoggingConfig {
    /// 创建新的日志配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志级别
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// 设置日志格式
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 设置是否显示目标
    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn show_thread_ids(mut self, show: bool) -> Self {
        self.show_thread_ids = show;
        self
    }

    /// 设置自定义过滤器
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 从环境变量读取配置
    ///
    /// - `RUST_LOG`：过滤器
    /// - `HYDRA_LOG_LEVEL`：级别
    /// - `HYDRA_LOG_FORMAT`：格式
    ///
    /// 无法解析的值会被忽略，保留默认值。
    pub fn from_env() -> Self {
        Self::default().apply_env(|name| std::env::var(name).ok())
    }

    fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(rust_log) = var("RUST_LOG") {
            self.filter = Some(rust_log);
        }

        if let Some(level) = var("HYDRA_LOG_LEVEL").and_then(|s| s.parse().ok()) {
            self.level = level;
        }

        if let Some(format) = var("HYDRA_LOG_FORMAT").and_then(|s| s.parse().ok()) {
            self.format = format;
        }

        self
    }

    /// 从 TOML 文本读取 `[logging]` 表，缺失的字段使用默认值
    pub fn from_toml_str(content: &str) -> ContainerResult<Self> {
        toml::from_str::<ConfigFile>(content)
            .map(|file| file.logging)
            .map_err(|e| ContainerError::InvalidConfig(e.to_string()))
    }

    /// 从 TOML 文件读取配置
    pub fn from_file(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContainerError::InvalidConfig(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string());
        match &self.filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| fallback()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }

    /// 初始化日志系统
    ///
    /// 全局订阅者只能安装一次，重复调用返回 `LoggingInitFailed`。
    pub fn init(self) -> ContainerResult<()> {
        let env_filter = self.env_filter();
        let builder = fmt()
            .with_env_filter(env_filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_thread_names(self.show_thread_names);

        let result = match self.format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Full => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        };

        result.map_err(|e| ContainerError::LoggingInitFailed(e.to_string()))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Full => write!(f, "full"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::new()
            .level(LogLevel::Debug)
            .format(LogFormat::Json)
            .show_target(true)
            .filter("hydra_aop=trace");

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.show_target);
        assert_eq!(config.filter.as_deref(), Some("hydra_aop=trace"));
    }

    #[test]
    fn test_apply_env() {
        let vars: HashMap<&str, &str> = [
            ("HYDRA_LOG_LEVEL", "trace"),
            ("HYDRA_LOG_FORMAT", "nonsense"),
        ]
        .into_iter()
        .collect();

        let config = LoggingConfig::new().apply_env(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_from_toml_str() {
        let config = LoggingConfig::from_toml_str(
            r#"
            [server]
            port = 8080

            [logging]
            level = "warn"
            format = "pretty"
            show_thread_ids = true
            "#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.show_thread_ids);
        assert!(!config.show_target);
    }

    #[test]
    fn test_from_toml_str_without_logging_table() {
        let config = LoggingConfig::from_toml_str("[server]\nport = 1").unwrap();
        assert_eq!(config.level, LogLevel::Info);
    }

    #[test]
    fn test_from_toml_str_invalid_level() {
        let error = LoggingConfig::from_toml_str("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(matches!(error, ContainerError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_missing_file() {
        let error = LoggingConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(error, ContainerError::InvalidConfig(msg) if msg.contains("here.toml")));
    }
}
