//! 日志记录定义
//!
//! `LogRecord` 由调用点产生，不持久化为对象，直接交给各个 sink 处理。

use crate::core::level::Level;
use chrono::{DateTime, Local};
use std::path::Path;

/// 写入 `created` 列的时间格式（ISO-8601，微秒精度）
pub const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// 调用点位置信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 源文件路径
    pub pathname: &'static str,
    /// 源代码行号
    pub lineno: u32,
    /// 函数名
    pub funcname: &'static str,
}

impl SourceLocation {
    /// 无法获取函数名时使用的占位符
    pub const UNKNOWN_FUNCTION: &'static str = "<unknown>";

    pub const fn new(pathname: &'static str, lineno: u32, funcname: &'static str) -> Self {
        Self {
            pathname,
            lineno,
            funcname,
        }
    }

    /// 从 `#[track_caller]` 位置构造，函数名未知
    pub fn from_caller(location: &'static std::panic::Location<'static>) -> Self {
        Self::new(location.file(), location.line(), Self::UNKNOWN_FUNCTION)
    }
}

/// 单条日志记录
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// 产生记录的 logger 名称
    pub logger_name: String,
    /// 记录时间（本地时间）
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
    pub pathname: String,
    pub lineno: u32,
    pub funcname: String,
}

impl LogRecord {
    /// 以当前时间创建记录
    pub fn new(
        logger_name: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            logger_name: logger_name.into(),
            timestamp: Local::now(),
            level,
            message: message.into(),
            pathname: location.pathname.to_string(),
            lineno: location.lineno,
            funcname: location.funcname.to_string(),
        }
    }

    /// 覆盖时间戳
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// 源文件名（不含目录）
    pub fn filename(&self) -> &str {
        Path::new(&self.pathname)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.pathname)
    }

    /// `created` 列的文本表示
    pub fn created(&self) -> String {
        self.timestamp
            .naive_local()
            .format(ISO_TIMESTAMP_FORMAT)
            .to_string()
    }
}

/// 从 `std::any::type_name` 的结果中提取函数名
///
/// `my_crate::module::handler::{{closure}}` 返回 `handler`。
#[doc(hidden)]
pub fn short_function_name(path: &'static str) -> &'static str {
    path.rsplit("::")
        .find(|segment| !segment.is_empty() && *segment != "{{closure}}")
        .unwrap_or(path)
}
