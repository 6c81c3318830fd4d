//! 数据库模型定义
//!
//! 此模块定义了与 `logs` 表对应的 Rust 结构体，用于 Diesel ORM 操作。

use crate::core::record::LogRecord;
use crate::sinks::database::schema::logs;
use diesel::prelude::*;

/// 用于插入新日志记录的结构体
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = logs)]
pub struct NewLogRow<'a> {
    /// ISO-8601 时间戳
    pub created: String,
    /// 日志级别名称
    pub level: &'a str,
    /// 格式化后的消息
    pub message: &'a str,
    /// 源文件路径
    pub pathname: &'a str,
    /// 源代码行号
    pub lineno: i32,
    /// 函数名
    pub funcname: &'a str,
}

impl<'a> NewLogRow<'a> {
    /// 由记录和已格式化的消息构造插入行
    pub fn from_record(record: &'a LogRecord, message: &'a str) -> Self {
        Self {
            created: record.created(),
            level: record.level.as_str(),
            message,
            pathname: &record.pathname,
            lineno: i32::try_from(record.lineno).unwrap_or(i32::MAX),
            funcname: &record.funcname,
        }
    }
}

/// 从数据库查询的完整日志行
#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LogRow {
    /// 主键，自增 ID
    pub id: i32,
    pub created: Option<String>,
    pub level: Option<String>,
    pub message: Option<String>,
    pub pathname: Option<String>,
    pub lineno: Option<i32>,
    pub funcname: Option<String>,
}
