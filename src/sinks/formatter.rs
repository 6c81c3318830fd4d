//! 消息格式化
//!
//! 控制台 sink 与数据库 sink 都通过 `LogFormatter` 把记录转换为文本。
//! 模板中的占位符在构造时解析，未知占位符会直接报错。

use crate::core::record::LogRecord;
use crate::error::{LoggingError, Result};
use chrono::format::{Item, StrftimeItems};

/// 控制台默认模板：`<timestamp> [<LEVEL>] <source-file>: <message>`
pub const DEFAULT_CONSOLE_TEMPLATE: &str = "{timestamp} [{level}] {filename}: {message}";
/// 数据库默认模板：只保存消息本身，其余信息已有独立的列
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "{message}";
/// 默认时间格式，例如 `2024-01-01 12:00:00,123`
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// 记录格式化器
pub trait LogFormatter: Send + Sync + std::fmt::Debug {
    fn format(&self, record: &LogRecord) -> Result<String>;
}

/// 模板中可用的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Timestamp,
    Level,
    Name,
    Message,
    Pathname,
    Filename,
    Lineno,
    Funcname,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "timestamp" => Some(Field::Timestamp),
            "level" => Some(Field::Level),
            "name" => Some(Field::Name),
            "message" => Some(Field::Message),
            "pathname" => Some(Field::Pathname),
            "filename" => Some(Field::Filename),
            "lineno" => Some(Field::Lineno),
            "funcname" => Some(Field::Funcname),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// 基于 `{field}` 占位符的格式化器
///
/// `{{` 和 `}}` 输出字面量花括号。
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    segments: Vec<Segment>,
    timestamp_format: String,
}

impl TemplateFormatter {
    /// 解析模板与时间格式
    pub fn new(template: &str, timestamp_format: &str) -> Result<Self> {
        validate_timestamp_format(timestamp_format)?;
        Ok(Self {
            segments: parse_template(template)?,
            timestamp_format: timestamp_format.to_string(),
        })
    }

    /// 只输出消息文本
    pub fn message_only() -> Self {
        Self {
            segments: vec![Segment::Field(Field::Message)],
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// 控制台默认格式
    pub fn console_default() -> Self {
        // 常量模板，解析不会失败
        Self::new(DEFAULT_CONSOLE_TEMPLATE, DEFAULT_TIMESTAMP_FORMAT)
            .unwrap_or_else(|_| Self::message_only())
    }

    /// 按模板渲染，`level` 字段由调用方决定如何着色
    pub(crate) fn render_with(&self, record: &LogRecord, level: &str) -> String {
        let mut out = String::with_capacity(record.message.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => match field {
                    Field::Timestamp => {
                        out.push_str(&record.timestamp.format(&self.timestamp_format).to_string())
                    }
                    Field::Level => out.push_str(level),
                    Field::Name => out.push_str(&record.logger_name),
                    Field::Message => out.push_str(&record.message),
                    Field::Pathname => out.push_str(&record.pathname),
                    Field::Filename => out.push_str(record.filename()),
                    Field::Lineno => out.push_str(&record.lineno.to_string()),
                    Field::Funcname => out.push_str(&record.funcname),
                },
            }
        }
        out
    }
}

impl Default for TemplateFormatter {
    fn default() -> Self {
        Self::message_only()
    }
}

impl LogFormatter for TemplateFormatter {
    fn format(&self, record: &LogRecord) -> Result<String> {
        Ok(self.render_with(record, record.level.as_str()))
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(LoggingError::InvalidTemplate(format!(
                                "unclosed placeholder in '{}'",
                                template
                            )))
                        }
                    }
                }
                let field = Field::parse(name.trim()).ok_or_else(|| {
                    LoggingError::InvalidTemplate(format!("unknown placeholder '{{{}}}'", name))
                })?;
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(field));
            }
            '}' => {
                return Err(LoggingError::InvalidTemplate(format!(
                    "unmatched '}}' in '{}'",
                    template
                )))
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// 校验 strftime 格式，避免在写日志时才发现错误
pub fn validate_timestamp_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(LoggingError::InvalidTemplate(format!(
            "invalid timestamp format '{}'",
            format
        )));
    }
    Ok(())
}
