//! 控制台输出 Sink 实现
//!
//! 将记录格式化为 `<timestamp> [<LEVEL>] <source-file>: <message>` 并写入标准错误
//! （可配置为标准输出或自定义 writer），支持彩色级别输出和级别过滤。

use crate::config::{ConsoleSinkConfig, ConsoleTarget};
use crate::core::level::Level;
use crate::core::record::LogRecord;
use crate::error::{LoggingError, Result};
use crate::sinks::formatter::TemplateFormatter;
use crate::sinks::{default_reporter, ErrorReporter, Sink};

use colored::Colorize;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// 控制台输出目标
pub enum ConsoleWriter {
    Stderr,
    Stdout,
    /// 自定义输出，例如嵌入到其他程序或测试中捕获输出
    Custom(Mutex<Box<dyn Write + Send>>),
}

impl ConsoleWriter {
    pub fn custom<W: Write + Send + 'static>(writer: W) -> Self {
        ConsoleWriter::Custom(Mutex::new(Box::new(writer)))
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            ConsoleWriter::Stderr => {
                let mut stderr = io::stderr().lock();
                writeln!(stderr, "{}", line)?;
                stderr.flush()
            }
            ConsoleWriter::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", line)?;
                stdout.flush()
            }
            ConsoleWriter::Custom(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                writeln!(writer, "{}", line)?;
                writer.flush()
            }
        }
    }
}

impl From<ConsoleTarget> for ConsoleWriter {
    fn from(target: ConsoleTarget) -> Self {
        match target {
            ConsoleTarget::Stderr => ConsoleWriter::Stderr,
            ConsoleTarget::Stdout => ConsoleWriter::Stdout,
        }
    }
}

impl fmt::Debug for ConsoleWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleWriter::Stderr => f.write_str("Stderr"),
            ConsoleWriter::Stdout => f.write_str("Stdout"),
            ConsoleWriter::Custom(_) => f.write_str("Custom(<writer>)"),
        }
    }
}

/// 控制台输出 Sink
pub struct ConsoleSink {
    level: Level,
    color_enabled: bool,
    formatter: TemplateFormatter,
    writer: ConsoleWriter,
    reporter: Arc<dyn ErrorReporter>,
}

impl ConsoleSink {
    /// 根据配置创建控制台 Sink
    pub fn new(config: &ConsoleSinkConfig) -> Result<Self> {
        let formatter = TemplateFormatter::new(&config.template, &config.timestamp_format)?;
        Ok(Self {
            level: config.level,
            color_enabled: config.color_enabled,
            formatter,
            writer: config.target.into(),
            reporter: default_reporter(),
        })
    }

    /// 替换输出目标
    pub fn with_writer(mut self, writer: ConsoleWriter) -> Self {
        self.writer = writer;
        self
    }

    /// 替换错误报告器
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// 设置级别过滤器
    pub fn with_level_filter(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 格式化事件
    pub fn format_record(&self, record: &LogRecord) -> String {
        if self.color_enabled {
            let level = colorize_level(record.level);
            self.formatter.render_with(record, &level)
        } else {
            self.formatter.render_with(record, record.level.as_str())
        }
    }
}

fn colorize_level(level: Level) -> String {
    let name = level.as_str();
    match level {
        Level::Debug => name.cyan().to_string(),
        Level::Info => name.green().to_string(),
        Level::Warning => name.yellow().to_string(),
        Level::Error => name.red().to_string(),
        Level::Critical => name.red().bold().to_string(),
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("level", &self.level)
            .field("color_enabled", &self.color_enabled)
            .field("writer", &self.writer)
            .finish()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn level(&self) -> Level {
        self.level
    }

    fn try_emit(&self, record: &LogRecord) -> Result<()> {
        let line = self.format_record(record);
        self.writer
            .write_line(&line)
            .map_err(|e| LoggingError::IoError { source: e })
    }

    fn error_reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }
}
