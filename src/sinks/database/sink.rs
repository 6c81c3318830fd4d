//! 数据库 Sink 实现
//!
//! 将每条日志记录同步写入 SQLite 的 `logs` 表。连接在 sink 的整个生命周期内持有，
//! 由 `close()` 显式释放，或在 sink 被丢弃时自动释放，且只释放一次。
//!
//! 轮转只在构造时自动执行一次：如果数据库文件超过配置的大小，删除早于保留期的行。
//! 长时间运行的进程需要自行定期调用 [`DatabaseSink::rotate`]，否则文件会在两次启动
//! 之间持续增长。

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Local};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, warn};

use crate::config::DatabaseSinkConfig;
use crate::core::level::Level;
use crate::core::record::{LogRecord, ISO_TIMESTAMP_FORMAT};
use crate::error::{LoggingError, Result};
use crate::sinks::database::models::NewLogRow;
use crate::sinks::database::schema::{logs, SQLITE_CREATE_TABLE};
use crate::sinks::formatter::{LogFormatter, TemplateFormatter};
use crate::sinks::{default_reporter, ErrorReporter, Sink};

/// 数据库 Sink 的运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseSinkStats {
    /// 成功写入的行数
    pub rows_written: u64,
    /// 写入失败（已报告并丢弃）的记录数
    pub failed_emits: u64,
    /// 轮转删除的行数
    pub rows_rotated: u64,
}

#[derive(Debug, Default)]
struct Counters {
    rows_written: AtomicU64,
    failed_emits: AtomicU64,
    rows_rotated: AtomicU64,
}

/// SQLite 数据库 Sink
pub struct DatabaseSink {
    /// `None` 表示连接已释放
    connection: Mutex<Option<SqliteConnection>>,
    config: DatabaseSinkConfig,
    formatter: Box<dyn LogFormatter>,
    reporter: Arc<dyn ErrorReporter>,
    counters: Counters,
}

impl fmt::Debug for DatabaseSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSink")
            .field("config", &self.config)
            .field("formatter", &self.formatter)
            .finish_non_exhaustive()
    }
}

impl DatabaseSink {
    /// 打开（或创建）数据库文件，确保表存在，并执行一次轮转检查
    ///
    /// 无法打开数据库、建表失败或轮转失败都会返回错误：无法写入存储的 sink
    /// 不应该被构造出来。
    pub fn new(config: DatabaseSinkConfig) -> Result<Self> {
        let formatter = TemplateFormatter::new(&config.message_template, &config.timestamp_format)?;
        Self::with_formatter(config, Box::new(formatter))
    }

    /// 使用自定义消息格式化器创建
    pub fn with_formatter(
        config: DatabaseSinkConfig,
        formatter: Box<dyn LogFormatter>,
    ) -> Result<Self> {
        let connection = Self::open_connection(&config.db_path)?;

        let sink = Self {
            connection: Mutex::new(Some(connection)),
            config,
            formatter,
            reporter: default_reporter(),
            counters: Counters::default(),
        };

        sink.ensure_table()?;
        sink.rotate()?;

        info!(
            "database sink opened at {} (max size: {:?} bytes, retention: {} days)",
            sink.config.db_path.display(),
            sink.config.max_db_size_bytes(),
            sink.config.retention_days
        );
        Ok(sink)
    }

    /// 替换错误报告器
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    fn open_connection(path: &Path) -> Result<SqliteConnection> {
        let url = path.to_str().ok_or_else(|| {
            LoggingError::connection(format!("non UTF-8 database path: {}", path.display()))
        })?;

        SqliteConnection::establish(url).map_err(|e| {
            LoggingError::connection(format!("failed to open {}: {}", path.display(), e))
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<SqliteConnection>> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 在持有的连接上执行操作，连接已释放时返回 `SinkClosed`
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut SqliteConnection) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(conn) => op(conn),
            None => Err(LoggingError::SinkClosed(format!(
                "database connection to {} already released",
                self.config.db_path.display()
            ))),
        }
    }

    fn ensure_table(&self) -> Result<()> {
        self.with_connection(|conn| {
            diesel::sql_query(SQLITE_CREATE_TABLE)
                .execute(conn)
                .map_err(|e| LoggingError::database(format!("failed to create logs table: {}", e)))
        })?;
        debug!("logs table ready in {}", self.config.db_path.display());
        Ok(())
    }

    /// 大小检查与按保留期删除
    ///
    /// 只有配置了最大大小且文件超过该大小时才会删除行，返回删除的行数。
    pub fn rotate(&self) -> Result<usize> {
        let max_size = match self.config.max_db_size_bytes() {
            Some(max_size) => max_size,
            None => return Ok(0),
        };

        let size = self.file_size()?;
        if size <= max_size {
            return Ok(0);
        }

        let cutoff = match retention_cutoff(self.config.retention_days) {
            Some(cutoff) => cutoff,
            None => {
                debug!(
                    "retention of {} days reaches before the earliest representable date, nothing expires",
                    self.config.retention_days
                );
                return Ok(0);
            }
        };
        let deleted = self.with_connection(|conn| {
            diesel::delete(logs::table.filter(logs::created.lt(cutoff.as_str())))
                .execute(conn)
                .map_err(|e| LoggingError::database(format!("rotation delete failed: {}", e)))
        })?;

        self.counters
            .rows_rotated
            .fetch_add(deleted as u64, Ordering::Relaxed);
        info!(
            "rotated {}: {} bytes > {} bytes, deleted {} rows created before {}",
            self.config.db_path.display(),
            size,
            max_size,
            deleted,
            cutoff
        );
        Ok(deleted)
    }

    /// 数据库文件当前的磁盘大小
    pub fn file_size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.config.db_path)?.len())
    }

    /// 释放数据库连接
    ///
    /// 之后的写入会被报告为 `SinkClosed`。重复调用不会出错。
    pub fn close(&self) -> Result<()> {
        if self.lock().take().is_some() {
            debug!("database sink {} closed", self.config.db_path.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.config.db_path
    }

    pub fn config(&self) -> &DatabaseSinkConfig {
        &self.config
    }

    pub fn stats(&self) -> DatabaseSinkStats {
        DatabaseSinkStats {
            rows_written: self.counters.rows_written.load(Ordering::Relaxed),
            failed_emits: self.counters.failed_emits.load(Ordering::Relaxed),
            rows_rotated: self.counters.rows_rotated.load(Ordering::Relaxed),
        }
    }

    fn insert(&self, record: &LogRecord) -> Result<()> {
        let message = self.formatter.format(record)?;
        let row = NewLogRow::from_record(record, &message);

        self.with_connection(|conn| {
            diesel::insert_into(logs::table)
                .values(&row)
                .execute(conn)
                .map_err(|e| LoggingError::database(format!("insert failed: {}", e)))
        })?;
        Ok(())
    }
}

/// 保留期截止时间，与 `created` 列使用相同的文本格式以便按字典序比较
///
/// 保留期超出可表示的日期范围时返回 `None`，即没有任何行过期。
fn retention_cutoff(retention_days: u32) -> Option<String> {
    let retention = Duration::try_days(i64::from(retention_days))?;
    let cutoff = Local::now().naive_local().checked_sub_signed(retention)?;
    Some(cutoff.format(ISO_TIMESTAMP_FORMAT).to_string())
}

impl Sink for DatabaseSink {
    fn name(&self) -> &'static str {
        "database"
    }

    fn level(&self) -> Level {
        self.config.level
    }

    fn try_emit(&self, record: &LogRecord) -> Result<()> {
        match self.insert(record) {
            Ok(()) => {
                self.counters.rows_written.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.counters.failed_emits.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn error_reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }

    fn close(&self) -> Result<()> {
        DatabaseSink::close(self)
    }
}

impl Drop for DatabaseSink {
    fn drop(&mut self) {
        let leaked = self
            .connection
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if leaked.is_some() {
            warn!(
                "database sink {} dropped without close(), releasing connection",
                self.config.db_path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::SourceLocation;
    use crate::sinks::database::models::LogRow;
    use crate::sinks::test_support::CollectingReporter;
    use tempfile::tempdir;

    fn record(level: Level, message: &str) -> LogRecord {
        LogRecord::new(
            "app",
            level,
            message,
            SourceLocation::new("src/jobs/import.rs", 88, "import_batch"),
        )
    }

    fn read_rows(path: &Path) -> Vec<LogRow> {
        let mut conn = SqliteConnection::establish(path.to_str().unwrap()).unwrap();
        logs::table
            .select(LogRow::as_select())
            .order(logs::id.asc())
            .load(&mut conn)
            .unwrap()
    }

    #[test]
    fn test_sqlite_database_sink_creation() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let sink = DatabaseSink::new(DatabaseSinkConfig::new(&db_path)).unwrap();

        assert!(db_path.exists());
        assert!(!sink.is_closed());
        assert_eq!(sink.level(), Level::Debug);
        assert!(read_rows(&db_path).is_empty());
    }

    #[test]
    fn test_emit_inserts_one_row() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let sink = DatabaseSink::new(DatabaseSinkConfig::new(&db_path)).unwrap();

        let rec = record(Level::Warning, "quota exceeded");
        sink.handle(&rec);

        let rows = read_rows(&db_path);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.created.as_deref(), Some(rec.created().as_str()));
        assert_eq!(row.level.as_deref(), Some("WARNING"));
        assert_eq!(row.message.as_deref(), Some("quota exceeded"));
        assert_eq!(row.pathname.as_deref(), Some("src/jobs/import.rs"));
        assert_eq!(row.lineno, Some(88));
        assert_eq!(row.funcname.as_deref(), Some("import_batch"));
        assert_eq!(sink.stats().rows_written, 1);
    }

    #[test]
    fn test_message_template_is_applied() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let config = DatabaseSinkConfig {
            message_template: "{name}: {message}".to_string(),
            ..DatabaseSinkConfig::new(&db_path)
        };
        let sink = DatabaseSink::new(config).unwrap();

        sink.handle(&record(Level::Info, "hello"));

        assert_eq!(read_rows(&db_path)[0].message.as_deref(), Some("app: hello"));
    }

    #[test]
    fn test_emit_after_close_is_reported() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let reporter = Arc::new(CollectingReporter::default());
        let sink = DatabaseSink::new(DatabaseSinkConfig::new(&db_path))
            .unwrap()
            .with_reporter(reporter.clone());

        sink.close().unwrap();
        sink.close().unwrap();
        assert!(sink.is_closed());

        sink.handle(&record(Level::Error, "after close"));

        assert_eq!(reporter.count(), 1);
        assert!(reporter.reports.lock().unwrap()[0].2.contains("Sink closed"));
        assert_eq!(sink.stats().failed_emits, 1);
        assert!(read_rows(&db_path).is_empty());
    }

    #[test]
    fn test_corrupt_file_fails_construction() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("corrupt.db");
        std::fs::write(&db_path, vec![0xAB; 4096]).unwrap();

        let result = DatabaseSink::new(DatabaseSinkConfig::new(&db_path));
        let err = result.unwrap_err();
        assert_eq!(err.category(), "database");
    }

    #[test]
    fn test_rotation_disabled_without_max_size() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let sink = DatabaseSink::new(DatabaseSinkConfig {
            max_db_size_mb: None,
            retention_days: 0,
            ..DatabaseSinkConfig::new(&db_path)
        })
        .unwrap();

        sink.handle(&record(Level::Info, "old").with_timestamp(Local::now() - Duration::days(400)));

        assert_eq!(sink.rotate().unwrap(), 0);
        assert_eq!(read_rows(&db_path).len(), 1);
    }

    #[test]
    fn test_retention_cutoff_format() {
        let cutoff = retention_cutoff(90).unwrap();
        let expected = (Local::now() - Duration::days(90)).format("%Y-%m-%d").to_string();
        assert!(cutoff.starts_with(&expected));
        assert_eq!(cutoff.len(), "2024-01-01T00:00:00.000000".len());
    }

    #[test]
    fn test_retention_cutoff_out_of_range() {
        assert!(retention_cutoff(u32::MAX).is_none());
        assert!(retention_cutoff(0).is_some());
    }

    #[test]
    fn test_huge_retention_keeps_oversized_rows() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("forever.db");
        let writer = DatabaseSink::new(DatabaseSinkConfig {
            max_db_size_mb: None,
            ..DatabaseSinkConfig::new(&db_path)
        })
        .unwrap();
        let big = "x".repeat(1024 * 1024 + 512);
        writer.handle(
            &LogRecord::new("app", Level::Info, big, SourceLocation::new("a.rs", 1, "f"))
                .with_timestamp(Local::now() - Duration::days(3650)),
        );
        writer.close().unwrap();

        let sink = DatabaseSink::new(DatabaseSinkConfig {
            max_db_size_mb: Some(1),
            retention_days: u32::MAX,
            ..DatabaseSinkConfig::new(&db_path)
        })
        .unwrap();

        assert_eq!(sink.rotate().unwrap(), 0);
        assert_eq!(sink.stats().rows_rotated, 0);
        assert_eq!(read_rows(&db_path).len(), 1);
    }

    #[test]
    fn test_emit_into_corrupted_file_is_reported() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("c.db");
        let reporter = Arc::new(CollectingReporter::default());
        let sink = DatabaseSink::new(DatabaseSinkConfig::new(&db_path))
            .unwrap()
            .with_reporter(reporter.clone());

        std::fs::write(&db_path, vec![0xAB; 8192]).unwrap();
        sink.handle(&record(Level::Error, "after corruption"));

        assert_eq!(reporter.count(), 1);
        assert!(reporter.reports.lock().unwrap()[0].2.starts_with("Database error"));
        let stats = sink.stats();
        assert_eq!(stats.failed_emits, 1);
        assert_eq!(stats.rows_written, 0);
    }
}
