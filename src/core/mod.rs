//! 核心模块
//!
//! 本模块包含日志级别、日志记录、命名 logger、注册表以及 tracing 桥接层。

pub mod layer;
pub mod level;
pub mod logger;
pub mod record;
pub mod registry;

// 重新导出核心类型
pub use layer::LoggerLayer;
pub use level::Level;
pub use logger::Logger;
pub use record::{LogRecord, SourceLocation};
pub use registry::LoggerRegistry;
