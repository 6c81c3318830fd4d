//! 数据库表结构定义
//!
//! 使用 Diesel 的 table! 宏定义 `logs` 表，列均可为空以兼容已有的数据库文件。

diesel::table! {
    logs (id) {
        id -> Integer,
        created -> Nullable<Text>,
        level -> Nullable<Text>,
        message -> Nullable<Text>,
        pathname -> Nullable<Text>,
        lineno -> Nullable<Integer>,
        funcname -> Nullable<Text>,
    }
}

/// 创建表的 SQL 语句
pub const SQLITE_CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        created TEXT,
        level TEXT,
        message TEXT,
        pathname TEXT,
        lineno INTEGER,
        funcname TEXT
    )
"#;
