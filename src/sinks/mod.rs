//! Sink 模块
//!
//! 定义统一的 `Sink` 接口以及两种内置实现：控制台与 SQLite 数据库。
//!
//! 写入是尽力而为的：`try_emit` 返回 `Result`，`emit` 捕获错误并交给
//! sink 上配置的 `ErrorReporter`，错误不会传播到调用方。

pub mod console;
pub mod database;
pub mod formatter;

pub use console::{ConsoleSink, ConsoleWriter};
pub use database::{DatabaseSink, DatabaseSinkStats};
pub use formatter::{LogFormatter, TemplateFormatter};

use crate::core::level::Level;
use crate::core::record::LogRecord;
use crate::error::{LoggingError, Result};
use std::fmt::Debug;
use std::sync::Arc;

/// 日志输出目标
pub trait Sink: Send + Sync + Debug {
    /// sink 名称，用于错误报告和调试
    fn name(&self) -> &'static str;

    /// sink 自身的级别过滤
    fn level(&self) -> Level;

    /// 写入一条记录，错误原样返回
    fn try_emit(&self, record: &LogRecord) -> Result<()>;

    /// 写入失败时的报告通道
    fn error_reporter(&self) -> &dyn ErrorReporter;

    /// 释放 sink 持有的资源，重复调用是安全的
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// 尽力写入：失败只会被报告，不会传播
    fn emit(&self, record: &LogRecord) {
        if let Err(e) = self.try_emit(record) {
            self.error_reporter().report(self.name(), record, &e);
        }
    }

    /// 级别过滤后写入
    fn handle(&self, record: &LogRecord) {
        if record.level >= self.level() {
            self.emit(record);
        }
    }
}

/// 写入失败的报告接口
pub trait ErrorReporter: Send + Sync {
    fn report(&self, sink: &str, record: &LogRecord, error: &LoggingError);
}

impl<F> ErrorReporter for F
where
    F: Fn(&str, &LogRecord, &LoggingError) + Send + Sync,
{
    fn report(&self, sink: &str, record: &LogRecord, error: &LoggingError) {
        self(sink, record, error)
    }
}

/// 默认报告方式：向 stderr 打印警告后继续运行
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl ErrorReporter for StderrReporter {
    fn report(&self, sink: &str, record: &LogRecord, error: &LoggingError) {
        eprintln!("--- Logging error ---");
        eprintln!(
            "{} sink failed to emit record [{}]: {}",
            sink,
            error.category(),
            error
        );
        eprintln!(
            "Message: {:?} ({} logged from {}:{} in {})",
            record.message, record.level, record.pathname, record.lineno, record.funcname
        );
    }
}

/// 默认的共享报告器
pub fn default_reporter() -> Arc<dyn ErrorReporter> {
    Arc::new(StderrReporter)
}


#[cfg(test)]
mod tests {
    use super::test_support::CollectingReporter;
    use super::*;
    use crate::core::record::SourceLocation;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FailingSink {
        level: Level,
        attempts: AtomicUsize,
        reporter: Arc<CollectingReporter>,
    }

    impl Sink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn level(&self) -> Level {
            self.level
        }

        fn try_emit(&self, _record: &LogRecord) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(LoggingError::database("always fails"))
        }

        fn error_reporter(&self) -> &dyn ErrorReporter {
            self.reporter.as_ref()
        }
    }

    fn record(level: Level) -> LogRecord {
        LogRecord::new("app", level, "msg", SourceLocation::new("a.rs", 1, "f"))
    }

    #[test]
    fn test_emit_reports_instead_of_failing() {
        let reporter = Arc::new(CollectingReporter::default());
        let sink = FailingSink {
            level: Level::Debug,
            attempts: AtomicUsize::new(0),
            reporter: reporter.clone(),
        };

        sink.emit(&record(Level::Info));

        assert_eq!(reporter.count(), 1);
        let reports = reporter.reports.lock().unwrap();
        assert_eq!(reports[0].0, "failing");
        assert_eq!(reports[0].1, "msg");
        assert!(reports[0].2.contains("always fails"));
    }

    #[test]
    fn test_handle_applies_sink_level() {
        let reporter = Arc::new(CollectingReporter::default());
        let sink = FailingSink {
            level: Level::Error,
            attempts: AtomicUsize::new(0),
            reporter,
        };

        sink.handle(&record(Level::Warning));
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 0);

        sink.handle(&record(Level::Critical));
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closure_reporter() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let reporter = move |_: &str, _: &LogRecord, _: &LoggingError| {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        reporter.report("x", &record(Level::Info), &LoggingError::database("boom"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
