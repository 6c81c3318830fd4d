//! 日志宏
//!
//! 与 `Logger` 的方法不同，宏还会记录调用所在的函数名。

/// 当前函数名（不含模块路径与闭包后缀）
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        $crate::core::record::short_function_name(
            name.strip_suffix("::__here").unwrap_or(name),
        )
    }};
}

/// 以指定级别记录一条格式化消息
///
/// ```no_run
/// use logging_setup::{log, Level, LoggerRegistry};
///
/// let registry = LoggerRegistry::new();
/// let logger = registry.get_logger("app");
/// log!(logger, Level::Info, "loaded {} items", 3);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let __logger = &$logger;
        let __level: $crate::Level = $level;
        if __logger.is_enabled_for(__level) {
            __logger.log_at(
                __level,
                ::std::format!($($arg)+),
                $crate::SourceLocation::new(
                    ::std::file!(),
                    ::std::line!(),
                    $crate::function_name!(),
                ),
            );
        }
    }};
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Warning, $($arg)+) };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Error, $($arg)+) };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => { $crate::log!($logger, $crate::Level::Critical, $($arg)+) };
}
