//! logging_setup - 同时写入控制台与 SQLite 的日志库
//!
//! 每个 logger 挂载两个 sink：
//! - 控制台 sink：以 `<timestamp> [<LEVEL>] <source-file>: <message>` 格式写入 stderr
//! - 数据库 sink：每条记录写入 `logs` 表的一行，启动时按文件大小与保留期轮转
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use logging_setup::{info, Level, LoggerRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = LoggerRegistry::new();
//!     let logger = registry.create("app", "app_logs.db", Level::Debug, Some(5), 90)?;
//!
//!     logger.info("Application started");
//!     info!(logger, "loaded {} plugins", 3);
//!
//!     // 退出前释放数据库连接
//!     registry.shutdown()?;
//!     Ok(())
//! }
//! ```
//!
//! # 自定义配置
//!
//! ```rust,no_run
//! use logging_setup::{load_config, LoggerRegistry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 读取 logging.toml，并允许 LOGGING_SETUP_* 环境变量覆盖
//!     let config = load_config(Some(std::path::Path::new("logging.toml")))?;
//!     let registry = LoggerRegistry::new();
//!     let logger = registry.setup_logger(&config)?;
//!     logger.warning("configured from file");
//!     registry.shutdown()?;
//!     Ok(())
//! }
//! ```
//!
//! # 与 tracing 集成
//!
//! ```rust,no_run
//! use logging_setup::{LoggerLayer, LoggerRegistry, LoggerConfig};
//! use tracing_subscriber::layer::SubscriberExt;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = LoggerRegistry::new();
//!     let logger = registry.setup_logger(&LoggerConfig::default())?;
//!     let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));
//!     tracing::subscriber::set_global_default(subscriber)?;
//!
//!     tracing::info!("routed to console and SQLite");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
mod macros;
pub mod sinks;

// 重新导出主要类型
pub use crate::config::{
    load_config, load_config_from_file, load_config_from_str, validate_config, ConsoleSinkConfig,
    ConsoleTarget, DatabaseSinkConfig, LoggerConfig,
};
pub use crate::core::{Level, LogRecord, Logger, LoggerLayer, LoggerRegistry, SourceLocation};
pub use crate::error::{LoggingError, Result};
pub use crate::sinks::{
    ConsoleSink, ConsoleWriter, DatabaseSink, DatabaseSinkStats, ErrorReporter, LogFormatter, Sink,
    StderrReporter, TemplateFormatter,
};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
