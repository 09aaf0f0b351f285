//! Structured logging on top of the `log` crate
//!
//! Library code only uses the standard macros (`log::info!`, `log::warn!`,
//! ...). A host that wants output calls [`init_logging`] once at start; the
//! logger writes one formatted line per record to stderr so it never mixes
//! with command output on stdout.
//!
//! # Example
//!
//! ```rust,no_run
//! use armeria_core::logging::{LoggingConfig, LogFormat, LogLevel};
//!
//! let config = LoggingConfig::default()
//!     .with_level(LogLevel::Debug)
//!     .with_format(LogFormat::Json)
//!     .with_context_field("service", "armeria");
//!
//! armeria_core::logging::init_logging(&config).unwrap();
//! log::info!("Console starting");
//! ```

pub mod formatter;

pub use formatter::{LogEntry, LogFormat};

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Log levels in order of severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn to_filter(self) -> log::LevelFilter {
        log::Level::from(self).to_level_filter()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Trace => LogLevel::Trace,
        }
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Logger settings
#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Minimum level written
    pub level: LogLevel,
    pub format: LogFormat,
    /// Fields appended to every entry
    pub context_fields: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: LogLevel::Info, format: LogFormat::Human, context_fields: BTreeMap::new() }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a context field that appears in every log entry
    pub fn with_context_field(mut self, key: &str, value: &str) -> Self {
        self.context_fields.insert(key.to_string(), value.to_string());
        self
    }
}

/// Install the logger
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = log::set_boxed_logger(Box::new(StderrLogger { config: config.clone() }))
            .map(|()| log::set_max_level(config.level.to_filter()))
            .map_err(anyhow::Error::from);
    });
    result
}

struct StderrLogger {
    config: LoggingConfig,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::from(self.config.level)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_log_record(record, &self.config.context_fields);
        eprintln!("{}", self.config.format.format_entry(&entry));
    }

    fn flush(&self) {
        use std::io::Write;
        let _ = std::io::stderr().flush();
    }
}
