//! Log levels shared by every handler.
//!
//! Levels follow the conventional numeric scale (debug = 10 … critical = 50)
//! so thresholds compare the same way across console, file and email output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Severity of a log record, or the threshold of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No threshold: a handler at this level accepts every record.
    None,
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something unexpected that the app recovered from.
    Warning,
    /// An operation failed.
    Error,
    /// The app cannot continue; also triggers email notification.
    Critical,
}

impl LogLevel {
    /// Every level, lowest first.
    pub const ALL: [LogLevel; 6] = [
        Self::None,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Numeric value on the 0-50 scale.
    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Debug => 10,
            Self::Info => 20,
            Self::Warning => 30,
            Self::Error => 40,
            Self::Critical => 50,
        }
    }

    /// The lowercase name accepted by [`LogLevel::parse`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Whether a record at `record` passes a threshold of `self`.
    #[must_use]
    pub fn admits(self, record: LogLevel) -> bool {
        record >= self
    }

    /// Parse a level for the named setting, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLogLevel`] naming `option` if `value` is not a
    /// known level.
    pub fn parse(option: &'static str, value: &str) -> Result<Self, Error> {
        let lowered = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == lowered)
            .ok_or_else(|| Error::invalid_log_level(option, value))
    }

    /// Convert a `tracing` level, promoting to critical when flagged.
    #[must_use]
    pub fn from_tracing(level: tracing::Level, critical: bool) -> Self {
        if critical {
            return Self::Critical;
        }
        match level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Self::Debug,
            tracing::Level::INFO => Self::Info,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::ERROR => Self::Error,
        }
    }

    /// The most verbose `tracing` level this threshold lets through.
    #[must_use]
    pub fn to_tracing_filter(self) -> tracing::level_filters::LevelFilter {
        use tracing::level_filters::LevelFilter;
        match self {
            Self::None => LevelFilter::TRACE,
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NOTSET",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("log_level", s)
    }
}
