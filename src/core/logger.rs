//! 命名 logger
//!
//! logger 持有一个级别阈值和一组 sink。低于阈值的记录在创建之前就被丢弃；
//! 通过阈值的记录依次交给每个 sink，由 sink 再按自己的级别过滤。

use crate::core::level::Level;
use crate::core::record::{LogRecord, SourceLocation};
use crate::error::{LoggingError, Result};
use crate::sinks::Sink;

use std::fmt;
use std::panic::Location;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// 命名 logger
pub struct Logger {
    name: String,
    level: RwLock<Level>,
    sinks: RwLock<Vec<Box<dyn Sink>>>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("sinks", &self.sink_names())
            .finish()
    }
}

impl Logger {
    /// 创建没有 sink 的 logger，默认级别为 DEBUG
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(Level::Debug),
            sinks: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        *self.level.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_level(&self, level: Level) {
        *self.level.write().unwrap_or_else(PoisonError::into_inner) = level;
    }

    /// 指定级别的记录是否会被处理
    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// 追加一个 sink
    pub fn add_sink(&self, sink: Box<dyn Sink>) {
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sink);
    }

    /// 用新的 sink 集合替换现有 sink，旧 sink 会被关闭
    pub fn replace_sinks(&self, sinks: Vec<Box<dyn Sink>>) -> Result<()> {
        let old = {
            let mut guard = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, sinks)
        };
        debug!("logger '{}': replaced {} sink(s)", self.name, old.len());
        close_all(&old)
    }

    /// 移除并关闭所有 sink
    pub fn clear_sinks(&self) -> Result<()> {
        self.replace_sinks(Vec::new())
    }

    pub fn sink_count(&self) -> usize {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|sink| sink.name())
            .collect()
    }

    /// 关闭所有 sink，但保留它们的注册；之后的写入会被各 sink 报告
    pub fn close(&self) -> Result<()> {
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        close_all(&sinks)
    }

    /// 把已构造的记录分发给所有 sink
    pub fn handle(&self, record: &LogRecord) {
        if !self.is_enabled_for(record.level) {
            return;
        }
        let sinks = self.sinks.read().unwrap_or_else(PoisonError::into_inner);
        for sink in sinks.iter() {
            sink.handle(record);
        }
    }

    /// 在给定位置记录一条消息，供宏使用
    pub fn log_at(&self, level: Level, message: impl Into<String>, location: SourceLocation) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = LogRecord::new(self.name.as_str(), level, message, location);
        self.handle(&record);
    }

    /// 记录一条消息，文件与行号取自调用方
    ///
    /// 方法无法得知调用函数的名称，写入的 `funcname` 为 `<unknown>`。需要函数名时
    /// 请使用 [`log!`](crate::log)、[`info!`](crate::info) 等宏，它们会额外记录调用函数。
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.log_at(level, message, SourceLocation::from_caller(Location::caller()));
    }

    /// 以 DEBUG 级别记录，函数名记为 `<unknown>`，需要函数名时使用 [`debug!`](crate::debug)
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    /// 以 INFO 级别记录，函数名同样需要 [`info!`](crate::info) 宏才能获取
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    /// 以 WARNING 级别记录，函数名同样需要 [`warning!`](crate::warning) 宏才能获取
    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(Level::Warning, message);
    }

    /// 以 ERROR 级别记录，函数名同样需要 [`error!`](crate::error) 宏才能获取
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    /// 以 CRITICAL 级别记录，函数名同样需要 [`critical!`](crate::critical) 宏才能获取
    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(Level::Critical, message);
    }
}

/// 关闭全部 sink，返回遇到的第一个错误
fn close_all(sinks: &[Box<dyn Sink>]) -> Result<()> {
    let mut first_error: Option<LoggingError> = None;
    for sink in sinks {
        if let Err(e) = sink.close() {
            debug!("failed to close {} sink: {}", sink.name(), e);
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
