//! 定义 logging_setup 的所有配置结构体。
//!
//! 配置可以直接在代码中构造，也可以从 TOML 文件加载，或者通过 `load_config`
//! 叠加配置文件与 `LOGGING_SETUP_*` 环境变量。

use crate::core::level::Level;
use crate::error::{LoggingError, Result};
use crate::sinks::formatter::{
    validate_timestamp_format, TemplateFormatter, DEFAULT_CONSOLE_TEMPLATE,
    DEFAULT_MESSAGE_TEMPLATE, DEFAULT_TIMESTAMP_FORMAT,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 环境变量前缀，例如 `LOGGING_SETUP_DB_PATH`、`LOGGING_SETUP_CONSOLE__COLOR_ENABLED`
pub const ENV_PREFIX: &str = "LOGGING_SETUP";

const BYTES_PER_MB: u64 = 1024 * 1024;

// --- 辅助函数，用于提供配置项的默认值 ---
fn default_logger_name() -> String {
    "app".to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("app_logs.db")
}
fn default_level() -> Level {
    Level::Debug
}
fn default_max_db_size_mb() -> Option<u64> {
    Some(5)
}
fn default_retention_days() -> u32 {
    90
}
fn default_false() -> bool {
    false
}
fn default_console_template() -> String {
    DEFAULT_CONSOLE_TEMPLATE.to_string()
}
fn default_message_template() -> String {
    DEFAULT_MESSAGE_TEMPLATE.to_string()
}
fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

/// 控制台输出流
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleTarget {
    #[default]
    Stderr,
    Stdout,
}

/// 控制台 Sink 配置
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConsoleSinkConfig {
    /// sink 自身的级别过滤，logger 级别仍然是首道门槛
    #[serde(default = "default_level")]
    pub level: Level,
    #[serde(default)]
    pub target: ConsoleTarget,
    #[serde(default = "default_false")]
    pub color_enabled: bool,
    #[serde(default = "default_console_template")]
    pub template: String,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            target: ConsoleTarget::default(),
            color_enabled: default_false(),
            template: default_console_template(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

/// 数据库 Sink 配置，构造后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSinkConfig {
    pub db_path: PathBuf,
    /// 最大文件大小（MB），`None` 或 `0` 表示不做大小检查
    pub max_db_size_mb: Option<u64>,
    pub retention_days: u32,
    pub level: Level,
    pub message_template: String,
    pub timestamp_format: String,
}

impl DatabaseSinkConfig {
    /// 使用默认大小限制与保留期
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            max_db_size_mb: default_max_db_size_mb(),
            retention_days: default_retention_days(),
            level: Level::Debug,
            message_template: default_message_template(),
            timestamp_format: default_timestamp_format(),
        }
    }

    /// 以字节为单位的最大文件大小
    pub fn max_db_size_bytes(&self) -> Option<u64> {
        self.max_db_size_mb
            .filter(|mb| *mb > 0)
            .map(|mb| mb.saturating_mul(BYTES_PER_MB))
    }
}

impl Default for DatabaseSinkConfig {
    fn default() -> Self {
        Self::new(default_db_path())
    }
}

/// logger 工厂的顶层配置
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    #[serde(default = "default_logger_name")]
    pub name: String,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// logger 整体的最低级别
    #[serde(default = "default_level")]
    pub level: Level,
    #[serde(default = "default_max_db_size_mb")]
    pub max_db_size_mb: Option<u64>,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// 写入 `message` 列前使用的模板
    #[serde(default = "default_message_template")]
    pub message_template: String,
    #[serde(default)]
    pub console: ConsoleSinkConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: default_logger_name(),
            db_path: default_db_path(),
            level: default_level(),
            max_db_size_mb: default_max_db_size_mb(),
            retention_days: default_retention_days(),
            message_template: default_message_template(),
            console: ConsoleSinkConfig::default(),
        }
    }
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_db_size_mb(mut self, max_db_size_mb: Option<u64>) -> Self {
        self.max_db_size_mb = max_db_size_mb;
        self
    }

    pub fn with_retention_days(mut self, retention_days: u32) -> Self {
        self.retention_days = retention_days;
        self
    }

    /// 数据库 sink 的配置：sink 级别固定为 DEBUG，由 logger 级别把关
    pub fn database_sink_config(&self) -> DatabaseSinkConfig {
        DatabaseSinkConfig {
            db_path: self.db_path.clone(),
            max_db_size_mb: self.max_db_size_mb,
            retention_days: self.retention_days,
            level: Level::Debug,
            message_template: self.message_template.clone(),
            timestamp_format: self.console.timestamp_format.clone(),
        }
    }
}

/// 用于从 TOML 文件加载 `LoggerConfig` 的辅助函数。
pub fn load_config_from_file(path: &Path) -> Result<LoggerConfig> {
    if !path.exists() {
        return Err(LoggingError::ConfigFileMissing(
            path.to_string_lossy().into_owned(),
        ));
    }

    let config_str = std::fs::read_to_string(path)?;
    load_config_from_str(&config_str)
}

/// 用于从 TOML 字符串加载 `LoggerConfig` 的辅助函数。
pub fn load_config_from_str(config_str: &str) -> Result<LoggerConfig> {
    let config: LoggerConfig = toml::from_str(config_str)?;
    validate_config(&config)?;
    Ok(config)
}

/// 叠加可选的配置文件与 `LOGGING_SETUP_*` 环境变量，环境变量优先。
pub fn load_config(path: Option<&Path>) -> Result<LoggerConfig> {
    let mut builder = ::config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(LoggingError::ConfigFileMissing(
                path.to_string_lossy().into_owned(),
            ));
        }
        builder = builder.add_source(::config::File::from(path));
    }

    builder = builder.add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config: LoggerConfig = builder.build()?.try_deserialize()?;
    validate_config(&config)?;
    Ok(config)
}

/// 验证配置的有效性。
pub fn validate_config(config: &LoggerConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        return Err(LoggingError::config("logger name must not be empty"));
    }
    if config.db_path.as_os_str().is_empty() {
        return Err(LoggingError::config("db_path must not be empty"));
    }

    validate_timestamp_format(&config.console.timestamp_format)?;
    TemplateFormatter::new(&config.console.template, &config.console.timestamp_format)?;
    TemplateFormatter::new(&config.message_template, &config.console.timestamp_format)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    /// 读写 `LOGGING_SETUP_*` 环境变量的测试需要串行执行
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.name, "app");
        assert_eq!(config.db_path, PathBuf::from("app_logs.db"));
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.max_db_size_mb, Some(5));
        assert_eq!(config.retention_days, 90);
        assert_eq!(config.message_template, "{message}");
        assert_eq!(config.console, ConsoleSinkConfig::default());
    }

    #[test]
    fn test_console_config_defaults() {
        let config = ConsoleSinkConfig::default();
        assert_eq!(config.target, ConsoleTarget::Stderr);
        assert!(!config.color_enabled);
        assert_eq!(config.template, "{timestamp} [{level}] {filename}: {message}");
        assert_eq!(config.timestamp_format, "%Y-%m-%d %H:%M:%S,%3f");
    }

    #[test]
    fn test_max_db_size_bytes() {
        let mut config = DatabaseSinkConfig::new("x.db");
        assert_eq!(config.max_db_size_bytes(), Some(5 * 1024 * 1024));

        config.max_db_size_mb = None;
        assert_eq!(config.max_db_size_bytes(), None);

        config.max_db_size_mb = Some(0);
        assert_eq!(config.max_db_size_bytes(), None);
    }

    #[test]
    fn test_database_sink_config_is_permissive() {
        let config = LoggerConfig::new("svc")
            .with_level(Level::Error)
            .with_db_path("svc.db")
            .with_max_db_size_mb(None)
            .with_retention_days(7);

        let db = config.database_sink_config();
        assert_eq!(db.level, Level::Debug);
        assert_eq!(db.db_path, PathBuf::from("svc.db"));
        assert_eq!(db.max_db_size_mb, None);
        assert_eq!(db.retention_days, 7);
    }

    #[test]
    fn test_load_config_from_str() {
        let config = load_config_from_str(
            r#"
            name = "worker"
            db_path = "/var/log/worker.db"
            level = "warning"
            max_db_size_mb = 20
            retention_days = 30

            [console]
            target = "stdout"
            color_enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "worker");
        assert_eq!(config.level, Level::Warning);
        assert_eq!(config.max_db_size_mb, Some(20));
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.console.target, ConsoleTarget::Stdout);
        assert!(config.console.color_enabled);
    }

    #[test]
    fn test_invalid_config_values() {
        assert!(matches!(
            load_config_from_str("level = \"LOUD\""),
            Err(LoggingError::TomlError { .. })
        ));
        assert!(load_config_from_str("unknown_key = 1").is_err());
        assert!(matches!(
            load_config_from_str("name = \"\""),
            Err(LoggingError::ConfigError(_))
        ));
        assert!(matches!(
            load_config_from_str("message_template = \"{bogus}\""),
            Err(LoggingError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(LoggingError::ConfigFileMissing(_))));
    }

    #[test]
    fn test_load_config_layers_env_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logging.toml");
        std::fs::write(&path, "name = \"from_file\"\nretention_days = 10\n").unwrap();

        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        std::env::set_var("LOGGING_SETUP_RETENTION_DAYS", "3");
        let result = load_config(Some(&path));
        std::env::remove_var("LOGGING_SETUP_RETENTION_DAYS");

        let config = result.unwrap();
        assert_eq!(config.name, "from_file");
        assert_eq!(config.retention_days, 3);
        assert_eq!(config.max_db_size_mb, Some(5));
    }
}
