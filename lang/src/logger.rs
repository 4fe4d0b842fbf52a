//! Leveled logging with a process-global filter.
//!
//! The filter keeps an unusual ordering on purpose: a message is dropped
//! when the global level is numerically BELOW the message level, so `None`
//! silences everything and `Error` lets every level through. The global
//! level is set once at startup (from `--log-level`) and read everywhere
//! else.

use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    None = 0,
    Info = 1,
    Debug = 2,
    Warning = 3,
    Error = 4,
}

impl LogLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            3 => LogLevel::Warning,
            4 => LogLevel::Error,
            _ => LogLevel::None,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(LogLevel::None),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

static GLOBAL_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::None as u8);

/// Set the process-global log level.
pub fn set_level(level: LogLevel) {
    GLOBAL_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Current process-global log level.
pub fn level() -> LogLevel {
    LogLevel::from_u8(GLOBAL_LEVEL.load(Ordering::Relaxed))
}

/// Whether a message at `message_level` passes the global filter.
pub fn enabled(message_level: LogLevel) -> bool {
    level() >= message_level
}

/// ANSI color and printed name per level, indexed by numeric rank.
const LEVEL_DATA: [(&str, &str); 5] = [
    ("\x1b[0m", "NONE"),
    ("\x1b[0;32m", "INFO"),
    ("\x1b[38;5;214m", "DEBUG"),
    ("\x1b[0;33m", "WARN"),
    ("\x1b[0;31m", "ERROR"),
];

/// A named logger handle. Cheap to construct; every component keeps its own.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    name: &'static str,
}

impl Logger {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn log(&self, message_level: LogLevel, message: &str) {
        if !enabled(message_level) {
            return;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let (color, prefix) = LEVEL_DATA[message_level as usize];
        eprintln!(
            "[{}]{}[{}:{}]: \x1b[0m {}",
            timestamp, color, self.name, prefix, message
        );
    }
}
