//! Log records and the formats they are rendered in.

use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::level::LogLevel;

/// A single log event as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// When the event was created.
    pub time: DateTime<Local>,
    /// Severity.
    pub level: LogLevel,
    /// Name of the logger that produced it.
    pub logger: String,
    /// Rendered message.
    pub message: String,
    /// Source file of the call site, when known.
    pub file: Option<String>,
    /// Source line of the call site, when known.
    pub line: Option<u32>,
}

impl LogRecord {
    /// Create a record stamped with the current local time.
    #[must_use]
    pub fn new(logger: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            logger: logger.into(),
            message: message.into(),
            file: None,
            line: None,
        }
    }

    /// Attach the call site.
    #[must_use]
    pub fn with_location(mut self, file: Option<&str>, line: Option<u32>) -> Self {
        self.file = file.map(str::to_string);
        self.line = line;
        self
    }

    /// Timestamp in `2024-05-01 13:45:12,345` form.
    #[must_use]
    pub fn asctime(&self) -> String {
        self.time.format("%Y-%m-%d %H:%M:%S,%3f").to_string()
    }

    /// Timestamp in ISO-8601 form without offset. Microseconds are left out
    /// when they are zero.
    #[must_use]
    pub fn isotime(&self) -> String {
        if self.time.timestamp_subsec_micros() == 0 {
            self.time.format("%Y-%m-%dT%H:%M:%S").to_string()
        } else {
            self.time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
        }
    }
}

/// How a handler renders records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formatter {
    /// `time - name - LEVEL - message`
    #[default]
    Text,
    /// One JSON object per line with `time`, `level` and `message`.
    Json,
    /// Text line followed by the call site on a second line.
    Email,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    time: String,
    level: String,
    message: &'a str,
}

impl Formatter {
    /// Render `record` without a trailing newline.
    #[must_use]
    pub fn format(self, record: &LogRecord) -> String {
        match self {
            Self::Text => text_line(record, &record.message),
            Self::Json => {
                let line = JsonLine {
                    time: record.isotime(),
                    level: record.level.to_string(),
                    message: &record.message,
                };
                // Only strings go in, so serialization cannot fail.
                serde_json::to_string(&line).unwrap_or_default()
            }
            Self::Email => format!(
                "{}\n{}:{}",
                text_line(record, &record.message),
                record.file.as_deref().unwrap_or("<unknown>"),
                record.line.unwrap_or(0)
            ),
        }
    }
}

/// Render the text layout with `message` in place of the record's message.
pub(crate) fn text_line(record: &LogRecord, message: &str) -> String {
    format!(
        "{} - {} - {} - {}",
        record.asctime(),
        record.logger,
        record.level,
        message
    )
}

impl FromStr for Formatter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "email" => Ok(Self::Email),
            other => Err(Error::config_validation(format!(
                "unknown log format '{other}', expected text, json or email"
            ))),
        }
    }
}
