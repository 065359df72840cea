//! Diagnostic sinks for the wire trace
//!
//! With `debug_trace` enabled the client dumps every request line, header
//! block and response body through a [`Logger`]. Structured events go
//! through `tracing` regardless of this setting.

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Destination for wire-trace output
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    fn debug(&self, message: &str) {
        if self.enabled(LogLevel::Debug) {
            self.log(LogLevel::Debug, message);
        }
    }

    fn info(&self, message: &str) {
        if self.enabled(LogLevel::Info) {
            self.log(LogLevel::Info, message);
        }
    }

    fn warn(&self, message: &str) {
        if self.enabled(LogLevel::Warn) {
            self.log(LogLevel::Warn, message);
        }
    }

    fn error(&self, message: &str) {
        if self.enabled(LogLevel::Error) {
            self.log(LogLevel::Error, message);
        }
    }
}

/// Writes to stdout (debug/info) and stderr (warn/error)
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    level: LogLevel,
    prefix: String,
}

impl ConsoleLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            prefix: "[TourCMS]".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn format_message(&self, level: LogLevel, message: &str) -> String {
        format!("{} {}: {}", self.prefix, level.label(), message)
    }
}

impl Logger for ConsoleLogger {
    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    fn log(&self, level: LogLevel, message: &str) {
        let line = self.format_message(level, message);
        if level >= LogLevel::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Forwards to `tracing` under the `tourcms::wire` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "tourcms::wire", "{}", message),
            LogLevel::Info => tracing::info!(target: "tourcms::wire", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "tourcms::wire", "{}", message),
            LogLevel::Error => tracing::error!(target: "tourcms::wire", "{}", message),
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}

    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        min: Option<LogLevel>,
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for Capture {
        fn log(&self, level: LogLevel, message: &str) {
            self.lines.lock().unwrap().push((level, message.to_string()));
        }

        fn enabled(&self, level: LogLevel) -> bool {
            self.min.map_or(true, |min| level >= min)
        }
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_console_logger_filtering() {
        let logger = ConsoleLogger::new(LogLevel::Warn);
        assert!(!logger.enabled(LogLevel::Debug));
        assert!(!logger.enabled(LogLevel::Info));
        assert!(logger.enabled(LogLevel::Warn));
        assert!(logger.enabled(LogLevel::Error));
    }

    #[test]
    fn test_console_logger_format() {
        let logger = ConsoleLogger::new(LogLevel::Debug).with_prefix("[wire]");
        assert_eq!(
            logger.format_message(LogLevel::Debug, "GET /p/channels/list.xml"),
            "[wire] DEBUG: GET /p/channels/list.xml"
        );
    }

    #[test]
    fn test_provided_methods_respect_enabled() {
        let capture = Capture {
            min: Some(LogLevel::Info),
            ..Default::default()
        };
        capture.debug("dropped");
        capture.info("kept");
        capture.error("kept too");

        let lines = capture.lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (LogLevel::Info, "kept".to_string()));
    }

    #[test]
    fn test_tracing_logger_leaves_filtering_to_subscriber() {
        let logger = TracingLogger;
        assert!(logger.enabled(LogLevel::Debug));
        logger.debug("no subscriber installed");
    }

    #[test]
    fn test_noop_logger() {
        let logger = NoopLogger;
        assert!(!logger.enabled(LogLevel::Error));
        logger.debug("test");
        logger.error("test");
    }
}
