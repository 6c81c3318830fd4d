//! 基本用法示例
//!
//! 运行: cargo run --example basic_usage
//! 日志同时输出到 stderr 并写入当前目录下的 demo_logs.db。

use logging_setup::{critical, error, info, warning, Level, LoggerLayer, LoggerRegistry};
use tracing_subscriber::layer::SubscriberExt;

fn import_batch(registry: &LoggerRegistry, size: usize) {
    let logger = registry.get_logger("demo");
    info!(logger, "importing batch of {} items", size);
    if size > 100 {
        warning!(logger, "batch of {} items is larger than recommended", size);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = LoggerRegistry::new();
    let logger = registry.create("demo", "demo_logs.db", Level::Debug, Some(5), 90)?;

    logger.debug("debug message");
    logger.info("application started");
    import_batch(&registry, 250);
    error!(logger, "failed to reach {}", "backup.example.net");
    critical!(logger, "shutting down");

    // tracing 事件也会写入同一个 logger
    let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger.clone()));
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(job = "nightly", "tracing event routed to console and SQLite");
    });

    registry.shutdown()?;
    Ok(())
}
