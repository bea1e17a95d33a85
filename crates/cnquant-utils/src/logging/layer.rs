//! Bridge from `tracing` events to a [`Logger`].

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::level::LogLevel;

use super::record::LogRecord;
use super::{is_dispatching, Logger};

/// Field that promotes an `error!` event to critical.
pub const CRITICAL_FIELD: &str = "critical";

/// A `tracing_subscriber` layer that forwards every event to a [`Logger`].
///
/// Events at ERROR level carrying `critical = true` are logged as critical;
/// see [`critical!`](crate::critical).
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub(crate) fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if is_dispatching() {
            return;
        }
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let level = LogLevel::from_tracing(*metadata.level(), visitor.critical);
        let record = LogRecord::new(self.logger.name(), level, visitor.into_message())
            .with_location(metadata.file(), metadata.line());
        self.logger.submit(record);
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    message: String,
    fields: String,
    critical: bool,
}

impl EventVisitor {
    fn into_message(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            self.message + &self.fields
        }
    }
}

impl Visit for EventVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == CRITICAL_FIELD {
            self.critical = value;
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

/// Log a critical event through `tracing`.
///
/// Expands to `tracing::error!(critical = true, ...)`.
#[macro_export]
macro_rules! critical {
    ($($arg:tt)+) => {
        ::tracing::error!(critical = true, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::prelude::*;

    use super::super::{LoggerConfig, LoggerMode};
    use super::*;

    #[test]
    fn test_events_are_forwarded_with_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.log");
        let config = LoggerConfig::new("layer")
            .with_log_level("critical")
            .with_log_file(&path)
            .with_file_log_level("debug");
        let logger = Logger::build(&config, LoggerMode::Direct, None).unwrap();

        let subscriber = tracing_subscriber::registry().with(logger.layer());
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("fine detail");
            tracing::warn!(sample = "S42", "low coverage");
            crate::critical!("cannot continue");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("layer - DEBUG - fine detail"));
        assert!(lines[1].ends_with("layer - WARNING - low coverage sample=S42"));
        assert!(lines[2].ends_with("layer - CRITICAL - cannot continue"));
    }

    #[test]
    fn test_event_below_logger_level_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.log");
        let config = LoggerConfig::new("layer")
            .with_log_level("error")
            .with_log_file(&path)
            .with_file_log_level("error");
        let logger = Logger::new(&config).unwrap();

        let subscriber = tracing_subscriber::registry().with(logger.layer());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("routine");
            tracing::error!("failed");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("ERROR - failed"));
    }

    #[test]
    fn test_visitor_without_message() {
        let visitor = EventVisitor {
            message: String::new(),
            fields: " a=1 b=2".to_string(),
            critical: false,
        };
        assert_eq!(visitor.into_message(), "a=1 b=2");
    }
}
