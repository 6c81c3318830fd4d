//! tracing 桥接层
//!
//! 把 `tracing` 事件转换为 `LogRecord` 并交给 `Logger`，使 `tracing::info!` 等宏
//! 也能写入控制台与数据库。本 crate 自身的诊断事件会被跳过，避免递归写入。

use crate::core::level::Level;
use crate::core::logger::Logger;
use crate::core::record::LogRecord;

use std::fmt::{self, Write as _};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// 将 tracing 事件转发到 `Logger` 的层
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Arc<Logger>,
}

impl LoggerLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

/// 提取 `message` 字段，其余字段以 `key=value` 追加在消息后
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

fn is_own_target(target: &str) -> bool {
    target == OWN_TARGET
        || target
            .strip_prefix(OWN_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_own_target(metadata.target()) {
            return;
        }

        let level = Level::from(*metadata.level());
        if !self.logger.is_enabled_for(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord {
            logger_name: self.logger.name().to_string(),
            timestamp: chrono::Local::now(),
            level,
            message: visitor.finish(),
            pathname: metadata.file().unwrap_or("<unknown>").to_string(),
            lineno: metadata.line().unwrap_or(0),
            funcname: metadata
                .module_path()
                .unwrap_or_else(|| metadata.target())
                .to_string(),
        };
        self.logger.handle(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleSinkConfig;
    use crate::sinks::console::tests::SharedBuffer;
    use crate::sinks::{ConsoleSink, ConsoleWriter};
    use tracing_subscriber::layer::SubscriberExt;

    fn logger_with_buffer(level: Level) -> (Arc<Logger>, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let logger = Arc::new(Logger::new("bridge"));
        logger.set_level(level);
        logger.add_sink(Box::new(
            ConsoleSink::new(&ConsoleSinkConfig {
                template: "[{level}] {message}".to_string(),
                ..Default::default()
            })
            .unwrap()
            .with_writer(ConsoleWriter::custom(buffer.clone())),
        ));
        (logger, buffer)
    }

    #[test]
    fn test_tracing_events_reach_logger() {
        let (logger, buffer) = logger_with_buffer(Level::Info);
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "app::worker", "filtered out");
            tracing::info!(target: "app::worker", user = "ann", "signed in");
            tracing::warn!(target: "app::worker", "slow response");
        });

        let output = buffer.contents();
        assert!(!output.contains("filtered out"));
        assert!(output.contains("[INFO] signed in user=ann"));
        assert!(output.contains("[WARNING] slow response"));
    }

    #[test]
    fn test_own_diagnostics_are_skipped() {
        let (logger, buffer) = logger_with_buffer(Level::Debug);
        let subscriber = tracing_subscriber::registry().with(LoggerLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "logging_setup::sinks::database::sink", "internal");
            tracing::info!(target: "logging_setup_extra", "external");
        });

        let output = buffer.contents();
        assert!(!output.contains("internal"));
        assert!(output.contains("external"));
    }

    #[test]
    fn test_own_target_matching() {
        assert!(is_own_target("logging_setup"));
        assert!(is_own_target("logging_setup::core::logger"));
        assert!(!is_own_target("logging_setup_extra"));
        assert!(!is_own_target("app"));
    }
}
