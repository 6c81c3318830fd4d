//! Error types for logging_setup
//!
//! This module defines the error type shared by the logger, its sinks and the
//! configuration loader. Construction-time failures are returned to the caller;
//! emission-time failures are handed to an [`ErrorReporter`](crate::sinks::ErrorReporter)
//! and never reach application code.

use thiserror::Error;

/// Main error type for logging_setup operations
#[derive(Error, Debug)]
pub enum LoggingError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileMissing(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Invalid formatter template or timestamp format
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// I/O errors (database file metadata, console writes)
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },

    /// Layered configuration (file + environment) errors
    #[error("Configuration source error: {source}")]
    ConfigSourceError {
        #[from]
        source: ::config::ConfigError,
    },

    /// Opening the database file failed
    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    /// Statement execution errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// The sink was closed before the record arrived
    #[error("Sink closed: {0}")]
    SinkClosed(String),

}

/// Result type alias for logging_setup operations
pub type Result<T> = std::result::Result<T, LoggingError>;

impl LoggingError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new database error
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseError(msg.into())
    }

    /// Create a new database connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseConnection {
            message: msg.into(),
        }
    }

    /// Get the error category for logging purposes
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigError(_)
            | Self::ConfigFileMissing(_)
            | Self::InvalidLogLevel(_)
            | Self::InvalidTemplate(_)
            | Self::ConfigSourceError { .. } => "config",
            Self::IoError { .. } => "io",
            Self::TomlError { .. } => "toml",
            Self::DatabaseConnection { .. } | Self::DatabaseError(_) => "database",
            Self::SinkClosed(_) => "sink",
        }
    }
}
