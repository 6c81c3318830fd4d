//! logger 注册表与工厂
//!
//! 注册表是一个显式对象，由应用的组合根持有，不存在全局状态。同名 logger
//! 重复配置时会先关闭并替换已挂载的 sink，因此不会累积重复的输出。

use crate::config::{validate_config, LoggerConfig};
use crate::core::level::Level;
use crate::core::logger::Logger;
use crate::error::Result;
use crate::sinks::{ConsoleSink, DatabaseSink, ErrorReporter, Sink};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// 按名称管理 logger
#[derive(Default)]
pub struct LoggerRegistry {
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.names();
        names.sort();
        f.debug_struct("LoggerRegistry")
            .field("loggers", &names)
            .finish_non_exhaustive()
    }
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新建 sink 时使用的错误报告器，默认打印到 stderr
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<Logger>>> {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 获取指定名称的 logger，不存在时创建一个没有 sink 的 logger
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        self.lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Logger::new(name)))
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// 构造控制台 sink 与数据库 sink 并挂载到指定 logger
    ///
    /// 新 sink 全部构造成功后才会替换旧 sink；数据库无法打开时返回错误，
    /// logger 保持原样。
    pub fn setup_logger(&self, config: &LoggerConfig) -> Result<Arc<Logger>> {
        validate_config(config)?;

        let mut console = ConsoleSink::new(&config.console)?;
        let mut database = DatabaseSink::new(config.database_sink_config())?;
        if let Some(reporter) = &self.reporter {
            console = console.with_reporter(reporter.clone());
            database = database.with_reporter(reporter.clone());
        }

        let logger = self.get_logger(&config.name);
        logger.set_level(config.level);
        let sinks: Vec<Box<dyn Sink>> = vec![Box::new(console), Box::new(database)];
        if let Err(e) = logger.replace_sinks(sinks) {
            debug!("closing previous sinks of '{}' failed: {}", config.name, e);
        }

        info!(
            "logger '{}' configured: level={}, db_path={}",
            config.name,
            config.level,
            config.db_path.display()
        );
        Ok(logger)
    }

    /// 按参数创建 logger，`None` 的 `max_db_size_mb` 关闭大小检查
    pub fn create(
        &self,
        name: &str,
        db_path: impl Into<PathBuf>,
        level: Level,
        max_db_size_mb: Option<u64>,
        retention_days: u32,
    ) -> Result<Arc<Logger>> {
        let config = LoggerConfig::new(name)
            .with_db_path(db_path)
            .with_level(level)
            .with_max_db_size_mb(max_db_size_mb)
            .with_retention_days(retention_days);
        self.setup_logger(&config)
    }

    /// 从注册表移除 logger 并关闭它的 sink
    pub fn remove(&self, name: &str) -> Result<Option<Arc<Logger>>> {
        let removed = self.lock().remove(name);
        if let Some(logger) = &removed {
            logger.clear_sinks()?;
        }
        Ok(removed)
    }

    /// 关闭所有 logger 的 sink，应在应用退出前调用
    pub fn shutdown(&self) -> Result<()> {
        let loggers: Vec<Arc<Logger>> = self.lock().drain().map(|(_, logger)| logger).collect();
        let mut result = Ok(());
        for logger in loggers {
            if let Err(e) = logger.clear_sinks() {
                debug!("shutdown of logger '{}' failed: {}", logger.name(), e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

impl Drop for LoggerRegistry {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
