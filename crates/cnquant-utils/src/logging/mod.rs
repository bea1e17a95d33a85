//! Logging for CnQuant apps.
//!
//! A [`Logger`] fans records out to a set of handlers, each with its own
//! threshold:
//!
//! - **Console**: always present, writes to stderr at `log_level`.
//! - **File**: when `log_file` is set, plain or size-rotated, at
//!   `file_log_level`.
//! - **Email**: when SMTP settings are complete and `log_level` equals
//!   `log_level_for_emails`, one email per record at that level.
//!
//! A logger runs in one of two modes. [`LoggerMode::Direct`] writes from the
//! calling thread. [`LoggerMode::Queued`] hands records to a background
//! listener that must be started with [`Logger::start`].
//!
//! # Example
//!
//! ```no_run
//! use cnquant_utils::logging::{Logger, LoggerConfig};
//!
//! let config = LoggerConfig::new("cqcalc")
//!     .with_log_file("/app/logs/cqcalc.log")
//!     .with_file_log_level("info");
//! let logger = Logger::queued(&config)?;
//! logger.start()?;
//! logger.info("calculation started");
//! logger.stop()?;
//! # Ok::<(), cnquant_utils::Error>(())
//! ```

mod email;
mod handler;
mod layer;
mod queue;
mod record;
mod rotating;

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::SmtpConfig;
use crate::error::{Error, Result};
use crate::level::LogLevel;
use crate::mail::Mailer;

pub use email::EmailHandler;
pub use handler::{ConsoleHandler, FileHandler, Handler, HandlerKind};
pub use layer::{LoggerLayer, CRITICAL_FIELD};
pub use record::{Formatter, LogRecord};
pub use rotating::RotatingFileHandler;

use queue::QueueListener;

/// Size limit of the legacy rotating log file.
pub const LEGACY_MAX_BYTES: u64 = 1_000_000;

/// Backups kept by the legacy rotating log file.
pub const LEGACY_BACKUP_COUNT: usize = 3;

/// How records reach the handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggerMode {
    /// Handlers run on the calling thread.
    #[default]
    Direct,
    /// Handlers run on a background listener thread.
    Queued,
}

impl LoggerMode {
    fn default_file_format(self) -> Formatter {
        match self {
            Self::Direct => Formatter::Text,
            Self::Queued => Formatter::Json,
        }
    }

    fn rotates_by_default(self) -> bool {
        self == Self::Queued
    }
}

/// Settings for building a [`Logger`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Logger name, shown in every text record.
    pub name: String,
    /// Log file; file logging is disabled when unset.
    pub log_file: Option<PathBuf>,
    /// Threshold for the file handler.
    pub file_log_level: String,
    /// Threshold for the console handler.
    pub log_level: String,
    /// Level that enables and gates email notification.
    pub log_level_for_emails: String,
    /// Subject of notification emails.
    pub email_subject: String,
    /// Rotation size for rotating log files, in MiB.
    pub max_log_file_size_mb: u64,
    /// Rotated files kept.
    pub backup_count: usize,
    /// File record format; text for direct loggers and JSON for queued ones
    /// when unset.
    pub file_format: Option<Formatter>,
    /// Rotate the log file by size; on for queued loggers when unset.
    pub rotate_file: Option<bool>,
    /// Colour console messages by level.
    pub colored_console: bool,
    /// SMTP settings, filled from the shared `[smtp]` section.
    #[serde(skip)]
    pub smtp: SmtpConfig,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: "cnquant".to_string(),
            log_file: None,
            file_log_level: "error".to_string(),
            log_level: "info".to_string(),
            log_level_for_emails: "critical".to_string(),
            email_subject: String::new(),
            max_log_file_size_mb: 10,
            backup_count: 5,
            file_format: None,
            rotate_file: None,
            colored_console: false,
            smtp: SmtpConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Default settings for a logger called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Enable file logging to `path`.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Set the file threshold.
    #[must_use]
    pub fn with_file_log_level(mut self, level: impl Into<String>) -> Self {
        self.file_log_level = level.into();
        self
    }

    /// Set the console threshold.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the email level.
    #[must_use]
    pub fn with_log_level_for_emails(mut self, level: impl Into<String>) -> Self {
        self.log_level_for_emails = level.into();
        self
    }

    /// Set SMTP settings and the notification subject.
    #[must_use]
    pub fn with_smtp(mut self, smtp: SmtpConfig, subject: impl Into<String>) -> Self {
        self.smtp = smtp;
        self.email_subject = subject.into();
        self
    }

    /// Set rotation size (MiB) and backup count, and turn rotation on.
    #[must_use]
    pub fn with_rotation(mut self, max_log_file_size_mb: u64, backup_count: usize) -> Self {
        self.max_log_file_size_mb = max_log_file_size_mb;
        self.backup_count = backup_count;
        self.rotate_file = Some(true);
        self
    }

    /// Set the file record format.
    #[must_use]
    pub fn with_file_format(mut self, format: Formatter) -> Self {
        self.file_format = Some(format);
        self
    }

    /// Colour console messages by level.
    #[must_use]
    pub fn with_colored_console(mut self, colored: bool) -> Self {
        self.colored_console = colored;
        self
    }

    /// Rotation size in bytes.
    #[must_use]
    pub fn max_log_file_bytes(&self) -> u64 {
        self.max_log_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Check every level string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLogLevel`] naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        LogLevel::parse("log_level", &self.log_level)?;
        LogLevel::parse("file_log_level", &self.file_log_level)?;
        LogLevel::parse("log_level_for_emails", &self.log_level_for_emails)?;
        Ok(())
    }
}

#[derive(Debug)]
struct Inner {
    name: String,
    mode: LoggerMode,
    level: LogLevel,
    handlers: Arc<Vec<Box<dyn Handler>>>,
    queue: Option<QueueListener>,
}

/// A configured logger. Cloning is cheap and clones share handlers.
///
/// A queued logger stops its listener, delivering any queued records, when
/// the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl Logger {
    /// Build a direct logger.
    ///
    /// # Errors
    ///
    /// Returns an error if a level is invalid, the log directory cannot be
    /// created, the log file cannot be opened, or email settings are invalid.
    pub fn new(config: &LoggerConfig) -> Result<Self> {
        Self::build(config, LoggerMode::Direct, None)
    }

    /// Build a queued logger. Call [`Logger::start`] to begin delivery.
    ///
    /// Invalid email settings do not fail construction: the email handler
    /// is skipped and a warning is logged instead.
    ///
    /// # Errors
    ///
    /// Returns an error if a level is invalid or the log file cannot be
    /// opened.
    pub fn queued(config: &LoggerConfig) -> Result<Self> {
        Self::build(config, LoggerMode::Queued, None)
    }

    /// Build a logger in `mode`, optionally delivering email via `mailer`
    /// instead of SMTP.
    ///
    /// # Errors
    ///
    /// See [`Logger::new`] and [`Logger::queued`].
    pub fn build(
        config: &LoggerConfig,
        mode: LoggerMode,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> Result<Self> {
        let log_level = LogLevel::parse("log_level", &config.log_level)?;
        let file_log_level = LogLevel::parse("file_log_level", &config.file_log_level)?;
        let email_level = LogLevel::parse("log_level_for_emails", &config.log_level_for_emails)?;

        let mut handlers: Vec<Box<dyn Handler>> = vec![Box::new(
            ConsoleHandler::new(log_level).colored(config.colored_console),
        )];

        if let Some(path) = &config.log_file {
            create_parent_dir(path)?;
            let format = config
                .file_format
                .unwrap_or_else(|| mode.default_file_format());
            if config.rotate_file.unwrap_or_else(|| mode.rotates_by_default()) {
                handlers.push(Box::new(RotatingFileHandler::open(
                    path,
                    file_log_level,
                    format,
                    config.max_log_file_bytes(),
                    config.backup_count,
                )?));
            } else {
                handlers.push(Box::new(FileHandler::open(path, file_log_level, format)?));
            }
        }

        let mut setup_warning = None;
        if config.smtp.is_complete() && log_level == email_level {
            match EmailHandler::from_smtp(&config.smtp, &config.email_subject, email_level, mailer)
            {
                Ok(handler) => handlers.push(Box::new(handler)),
                Err(e) if mode == LoggerMode::Queued => {
                    setup_warning = Some(format!("Failed to set up email handler: {e}"));
                }
                Err(e) => return Err(e),
            }
        }

        let level = match mode {
            LoggerMode::Direct => {
                let file_level = if config.log_file.is_some() {
                    file_log_level
                } else {
                    LogLevel::Critical
                };
                log_level.min(file_level)
            }
            LoggerMode::Queued => handlers
                .iter()
                .map(|h| h.level())
                .min()
                .unwrap_or(LogLevel::Debug),
        };

        let logger = Self::from_handlers(&config.name, mode, level, handlers);
        if let Some(warning) = setup_warning {
            logger.warning(warning);
        }
        Ok(logger)
    }

    /// Assemble a logger from ready-made handlers.
    #[must_use]
    pub fn from_handlers(
        name: impl Into<String>,
        mode: LoggerMode,
        level: LogLevel,
        handlers: Vec<Box<dyn Handler>>,
    ) -> Self {
        let handlers = Arc::new(handlers);
        let queue = match mode {
            LoggerMode::Direct => None,
            LoggerMode::Queued => Some(QueueListener::new(Arc::clone(&handlers))),
        };
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                mode,
                level,
                handlers,
                queue,
            }),
        }
    }

    /// Logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Lowest level that reaches any handler.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.inner.level
    }

    /// Delivery mode.
    #[must_use]
    pub fn mode(&self) -> LoggerMode {
        self.inner.mode
    }

    /// Kinds of the attached handlers, in order.
    #[must_use]
    pub fn handlers(&self) -> Vec<HandlerKind> {
        self.inner.handlers.iter().map(|h| h.kind()).collect()
    }

    /// Whether the background listener is running. Always false for direct
    /// loggers.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.queue.as_ref().is_some_and(QueueListener::is_running)
    }

    /// Start background delivery. No-op for direct loggers or when already
    /// running.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener thread cannot be spawned.
    pub fn start(&self) -> Result<()> {
        match &self.inner.queue {
            Some(queue) => queue.start(&self.inner.name),
            None => Ok(()),
        }
    }

    /// Deliver every queued record and stop the listener. No-op for direct
    /// loggers or when not running.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener thread panicked.
    pub fn stop(&self) -> Result<()> {
        match &self.inner.queue {
            Some(queue) => queue.stop(),
            None => Ok(()),
        }
    }

    /// Log `message` at `level`, recording the caller's location.
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.inner.level.admits(level) {
            return;
        }
        let caller = std::panic::Location::caller();
        let record = LogRecord::new(self.name(), level, message)
            .with_location(Some(caller.file()), Some(caller.line()));
        self.submit(record);
    }

    /// Log at debug level.
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    /// Log at info level.
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Log at warning level.
    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    /// Log at error level.
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Log at critical level.
    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(LogLevel::Critical, message);
    }

    /// Hand a finished record to the handlers or the queue.
    pub(crate) fn submit(&self, record: LogRecord) {
        if !self.inner.level.admits(record.level) {
            return;
        }
        match &self.inner.queue {
            Some(queue) => queue.push(record),
            None => dispatch(&self.inner.handlers, &record),
        }
    }

    /// A `tracing` layer feeding this logger.
    #[must_use]
    pub fn layer(&self) -> LoggerLayer {
        LoggerLayer::new(self.clone())
    }

    /// Install this logger as the global `tracing` subscriber.
    ///
    /// `RUST_LOG` overrides the level filter when set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Subscriber`] if a global subscriber is already set.
    pub fn install(&self) -> Result<()> {
        let default_filter = self.level().to_tracing_filter().to_string();
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
        tracing_subscriber::registry()
            .with(env_filter)
            .with(self.layer())
            .try_init()
            .map_err(|e| Error::Subscriber(e.to_string()))
    }
}

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running handlers until dropped.
struct DispatchGuard {
    previous: bool,
}

impl DispatchGuard {
    fn enter() -> Self {
        Self {
            previous: DISPATCHING.with(|d| d.replace(true)),
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|d| d.set(self.previous));
    }
}

/// Whether handlers are running on this thread. Events raised by a handler
/// (or by crates it calls) are dropped by [`LoggerLayer`] while this holds.
pub(crate) fn is_dispatching() -> bool {
    DISPATCHING.with(Cell::get)
}

/// Pass `record` to every handler; handler failures go to stderr.
pub(crate) fn dispatch(handlers: &[Box<dyn Handler>], record: &LogRecord) {
    let _guard = DispatchGuard::enter();
    for handler in handlers {
        if let Err(e) = handler.handle(record) {
            eprintln!(
                "--- Logging error ---\n{:?} handler failed for record '{}': {e}",
                handler.kind(),
                record.message
            );
        }
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Legacy preset: rotating text file at INFO (1 MB, 3 backups) and console at
/// ERROR.
///
/// # Errors
///
/// Returns [`Error::LogDirectoryMissing`] if `log_directory` does not exist,
/// or an error if the log file cannot be opened.
pub fn setup_logger(log_directory: impl AsRef<Path>, log_file_name: &str) -> Result<Logger> {
    let log_directory = log_directory.as_ref();
    if !log_directory.is_dir() {
        return Err(Error::LogDirectoryMissing {
            path: log_directory.to_path_buf(),
        });
    }
    let file = RotatingFileHandler::open(
        log_directory.join(log_file_name),
        LogLevel::Info,
        Formatter::Text,
        LEGACY_MAX_BYTES,
        LEGACY_BACKUP_COUNT,
    )?;
    let handlers: Vec<Box<dyn Handler>> = vec![
        Box::new(file),
        Box::new(ConsoleHandler::new(LogLevel::Error)),
    ];
    Ok(Logger::from_handlers(
        "cnquant_utils",
        LoggerMode::Direct,
        LogLevel::Info,
        handlers,
    ))
}

/// Log `message` at error level.
#[track_caller]
pub fn log_error(logger: &Logger, message: impl Into<String>) {
    logger.error(message);
}

/// Log `message` at warning level.
#[track_caller]
pub fn log_warning(logger: &Logger, message: impl Into<String>) {
    logger.warning(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::testing::RecordingMailer;

    fn smtp() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "user@example.com".to_string(),
            password: "password".to_string(),
            email_to: "to@example.com".to_string(),
        }
    }

    #[test]
    fn test_init_valid_levels() {
        let config = LoggerConfig::new("test_init_valid_levels")
            .with_log_level("info")
            .with_file_log_level("error");
        let logger = Logger::new(&config).unwrap();
        assert_eq!(logger.name(), "test_init_valid_levels");
        assert_eq!(logger.level(), LogLevel::Info);
        assert_eq!(logger.mode(), LoggerMode::Direct);
    }

    #[test]
    fn test_init_invalid_log_level() {
        let config = LoggerConfig::new("x").with_log_level("invalid");
        let err = Logger::new(&config).unwrap_err();
        assert!(err.to_string().starts_with("log_level must be one of"));
    }

    #[test]
    fn test_init_invalid_file_log_level() {
        let config = LoggerConfig::new("x").with_file_log_level("invalid");
        let err = Logger::queued(&config).unwrap_err();
        assert!(err.to_string().starts_with("file_log_level must be one of"));
    }

    #[test]
    fn test_levels_are_case_insensitive() {
        let config = LoggerConfig::new("x").with_log_level("WARNING");
        assert_eq!(Logger::new(&config).unwrap().level(), LogLevel::Warning);
    }

    #[test]
    fn test_console_handler_only_by_default() {
        let logger = Logger::new(&LoggerConfig::new("x")).unwrap();
        assert_eq!(logger.handlers(), vec![HandlerKind::Console]);
    }

    #[test]
    fn test_direct_file_handler_setup() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig::new("x").with_log_file(dir.path().join("app.log"));
        let logger = Logger::new(&config).unwrap();
        assert_eq!(
            logger.handlers(),
            vec![HandlerKind::Console, HandlerKind::File]
        );
        // min(info, error)
        assert_eq!(logger.level(), LogLevel::Info);
    }

    #[test]
    fn test_direct_level_uses_file_level_when_lower() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig::new("x")
            .with_log_level("error")
            .with_log_file(dir.path().join("app.log"))
            .with_file_log_level("debug");
        assert_eq!(Logger::new(&config).unwrap().level(), LogLevel::Debug);
    }

    #[test]
    fn test_file_level_none_admits_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_log_file(&path)
            .with_file_log_level("none");
        let logger = Logger::new(&config).unwrap();
        assert_eq!(logger.level(), LogLevel::None);

        logger.debug("very fine detail");
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("DEBUG - very fine detail"));
    }

    #[test]
    fn test_log_file_parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("app.log");
        let config = LoggerConfig::new("x").with_log_file(&path);
        let logger = Logger::new(&config).unwrap();
        logger.error("written");
        assert!(path.exists());
    }

    #[test]
    fn test_direct_logger_writes_text_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = LoggerConfig::new("cqcase")
            .with_log_level("critical")
            .with_log_file(&path)
            .with_file_log_level("warning");
        let logger = Logger::new(&config).unwrap();

        logger.info("skipped");
        logger.warning("kept");
        log_error(&logger, "also kept");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("cqcase - WARNING - kept"));
        assert!(lines[1].ends_with("cqcase - ERROR - also kept"));
    }

    #[test]
    fn test_email_handler_setup() {
        let mailer = RecordingMailer::default();
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_smtp(smtp(), "CQall failure");
        let logger =
            Logger::build(&config, LoggerMode::Direct, Some(Arc::new(mailer.clone()))).unwrap();
        assert_eq!(
            logger.handlers(),
            vec![HandlerKind::Console, HandlerKind::Email]
        );

        logger.error("no mail");
        logger.critical("mail me");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "CQall failure");
        assert!(sent[0].body.contains("CRITICAL - mail me"));
        assert!(sent[0].body.contains("mod.rs:"));
    }

    #[test]
    fn test_email_handler_requires_matching_levels() {
        let config = LoggerConfig::new("x")
            .with_log_level("info")
            .with_smtp(smtp(), "subject");
        let logger = Logger::new(&config).unwrap();
        assert_eq!(logger.handlers(), vec![HandlerKind::Console]);
    }

    #[test]
    fn test_email_handler_requires_complete_smtp() {
        let mut incomplete = smtp();
        incomplete.password = String::new();
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_smtp(incomplete, "subject");
        let logger = Logger::new(&config).unwrap();
        assert_eq!(logger.handlers(), vec![HandlerKind::Console]);
    }

    #[test]
    fn test_invalid_email_settings_fail_direct_logger() {
        let mut bad = smtp();
        bad.email_to = "nobody".to_string();
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_smtp(bad, "subject");
        assert!(Logger::new(&config).unwrap_err().is_mail_error());
    }

    #[test]
    fn test_invalid_email_settings_warn_in_queued_logger() {
        let mut bad = smtp();
        bad.email_to = "nobody".to_string();
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_smtp(bad, "subject");
        let logger = Logger::queued(&config).unwrap();
        assert_eq!(logger.handlers(), vec![HandlerKind::Console]);
    }

    #[test]
    fn test_email_setup_warning_reaches_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("async.log");
        let mut bad = smtp();
        bad.email_to = "nobody".to_string();
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_log_level_for_emails("critical")
            .with_log_file(&path)
            .with_file_log_level("warning")
            .with_smtp(bad, "subject");
        let logger = Logger::queued(&config).unwrap();
        assert_eq!(
            logger.handlers(),
            vec![HandlerKind::Console, HandlerKind::RotatingFile]
        );

        logger.start().unwrap();
        logger.stop().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(value["level"], "WARNING");
        assert!(value["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to set up email handler: "));
    }

    /// Records, per emitted record, whether the dispatch guard was set.
    #[derive(Debug)]
    struct GuardRecordingHandler {
        seen: Arc<std::sync::Mutex<Vec<bool>>>,
    }

    impl Handler for GuardRecordingHandler {
        fn kind(&self) -> HandlerKind {
            HandlerKind::Console
        }

        fn level(&self) -> LogLevel {
            LogLevel::None
        }

        fn emit(&self, _record: &LogRecord) -> Result<()> {
            self.seen.lock().unwrap().push(is_dispatching());
            Ok(())
        }
    }

    #[test]
    fn test_handlers_run_inside_dispatch_guard() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let handlers: Vec<Box<dyn Handler>> = vec![Box::new(GuardRecordingHandler {
            seen: Arc::clone(&seen),
        })];
        assert!(!is_dispatching());
        dispatch(&handlers, &LogRecord::new("x", LogLevel::Info, "m"));
        assert!(!is_dispatching());
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_queued_logger_defaults_to_rotating_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("async.log");
        let config = LoggerConfig::new("async")
            .with_log_file(&path)
            .with_file_log_level("info");
        let logger = Logger::queued(&config).unwrap();
        assert_eq!(
            logger.handlers(),
            vec![HandlerKind::Console, HandlerKind::RotatingFile]
        );
        assert_eq!(logger.level(), LogLevel::Info);

        logger.start().unwrap();
        logger.info("queued record");
        logger.stop().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(contents.trim()).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["message"], "queued record");
    }

    #[test]
    fn test_queued_level_is_min_of_handlers() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig::new("x")
            .with_log_level("error")
            .with_log_file(dir.path().join("a.log"))
            .with_file_log_level("warning");
        assert_eq!(Logger::queued(&config).unwrap().level(), LogLevel::Warning);

        let config = LoggerConfig::new("x").with_log_level("error");
        assert_eq!(Logger::queued(&config).unwrap().level(), LogLevel::Error);
    }

    #[test]
    fn test_queued_records_buffer_until_started() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buffered.log");
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_log_file(&path)
            .with_file_log_level("info");
        let logger = Logger::queued(&config).unwrap();

        logger.info("before start");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        logger.start().unwrap();
        logger.info("after start");
        logger.stop().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("before start"));
        assert!(lines[1].contains("after start"));
    }

    #[test]
    fn test_start_stop_queued_logging() {
        let logger = Logger::queued(&LoggerConfig::new("x")).unwrap();
        assert!(!logger.is_running());
        logger.start().unwrap();
        assert!(logger.is_running());
        logger.start().unwrap();
        assert!(logger.is_running());
        logger.stop().unwrap();
        assert!(!logger.is_running());
        // Restart after stop.
        logger.start().unwrap();
        assert!(logger.is_running());
        logger.stop().unwrap();
        logger.stop().unwrap();
    }

    #[test]
    fn test_direct_logger_start_stop_are_noops() {
        let logger = Logger::new(&LoggerConfig::new("x")).unwrap();
        logger.start().unwrap();
        assert!(!logger.is_running());
        logger.stop().unwrap();
    }

    #[test]
    fn test_queued_email_delivered_on_listener() {
        let mailer = RecordingMailer::default();
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_smtp(smtp(), "subject");
        let logger =
            Logger::build(&config, LoggerMode::Queued, Some(Arc::new(mailer.clone()))).unwrap();
        assert_eq!(
            logger.handlers(),
            vec![HandlerKind::Console, HandlerKind::Email]
        );

        logger.start().unwrap();
        logger.critical("listener sends this");
        logger.stop().unwrap();

        assert_eq!(mailer.sent().len(), 1);
    }

    #[test]
    fn test_failing_handler_does_not_panic() {
        let mailer = RecordingMailer::failing();
        let config = LoggerConfig::new("x")
            .with_log_level("critical")
            .with_smtp(smtp(), "subject");
        let logger =
            Logger::build(&config, LoggerMode::Direct, Some(Arc::new(mailer))).unwrap();
        logger.critical("delivery fails but logging continues");
    }

    #[test]
    fn test_dropping_queued_logger_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drop.log");
        let config = LoggerConfig::new("x")
            .with_log_file(&path)
            .with_file_log_level("info");
        {
            let logger = Logger::queued(&config).unwrap();
            logger.start().unwrap();
            logger.info("flushed on drop");
        }
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("flushed on drop"));
    }

    #[test]
    fn test_setup_logger_legacy_preset() {
        let dir = tempfile::tempdir().unwrap();
        let logger = setup_logger(dir.path(), "legacy.log").unwrap();
        assert_eq!(
            logger.handlers(),
            vec![HandlerKind::RotatingFile, HandlerKind::Console]
        );
        assert_eq!(logger.level(), LogLevel::Info);

        logger.debug("ignored");
        logger.info("recorded");
        log_warning(&logger, "also recorded");

        let contents = std::fs::read_to_string(dir.path().join("legacy.log")).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("cnquant_utils - INFO - recorded"));
    }

    #[test]
    fn test_setup_logger_requires_existing_directory() {
        let err = setup_logger("/nonexistent/log/dir", "app.log").unwrap_err();
        assert!(matches!(err, Error::LogDirectoryMissing { .. }));
    }

    #[test]
    fn test_config_validate() {
        assert!(LoggerConfig::default().validate().is_ok());
        let config = LoggerConfig::new("x").with_log_level_for_emails("loud");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("log_level_for_emails"));
    }

    #[test]
    fn test_max_log_file_bytes() {
        let config = LoggerConfig::new("x").with_rotation(10, 5);
        assert_eq!(config.max_log_file_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.rotate_file, Some(true));
    }
}
