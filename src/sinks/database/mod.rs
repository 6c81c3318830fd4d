//! 数据库 Sink 模块
//!
//! 此模块提供将日志写入本地 SQLite 数据库的功能，包括建表、插入和按大小触发的轮转。

pub mod models;
pub mod schema;
pub mod sink;

pub use models::{LogRow, NewLogRow};
pub use sink::{DatabaseSink, DatabaseSinkStats};
