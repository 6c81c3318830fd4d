//! 日志级别定义
//!
//! 级别按严重程度排序：DEBUG < INFO < WARNING < ERROR < CRITICAL。

use crate::error::{LoggingError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// 日志级别
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(try_from = "String")]
pub enum Level {
    /// 调试信息，最宽松的级别
    #[default]
    Debug,
    Info,
    Warning,
    Error,
    /// 最高严重级别
    Critical,
}

impl Level {
    /// 所有级别，从低到高
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// 写入数据库和控制台时使用的级别名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARNING" | "WARN" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            "CRITICAL" | "FATAL" => Ok(Level::Critical),
            _ => Err(LoggingError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = LoggingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// tracing 没有 CRITICAL，TRACE 归入 DEBUG
impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}
