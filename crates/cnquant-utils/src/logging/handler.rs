//! Log handlers: where records end up.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::console::{colorize, Color};
use crate::error::{Error, Result};
use crate::level::LogLevel;

use super::record::{text_line, Formatter, LogRecord};

/// The kind of a handler, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Writes to stderr.
    Console,
    /// Appends to a single file.
    File,
    /// Appends to a file that is rotated by size.
    RotatingFile,
    /// Sends an email per record.
    Email,
}

/// A destination for log records with its own threshold.
pub trait Handler: Send + Sync + fmt::Debug {
    /// What kind of handler this is.
    fn kind(&self) -> HandlerKind;

    /// Lowest level this handler accepts.
    fn level(&self) -> LogLevel;

    /// Write the record unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be written or sent.
    fn emit(&self, record: &LogRecord) -> Result<()>;

    /// Write the record if it passes this handler's threshold.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Handler::emit`].
    fn handle(&self, record: &LogRecord) -> Result<()> {
        if self.level().admits(record.level) {
            self.emit(record)
        } else {
            Ok(())
        }
    }
}

/// Writes text records to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleHandler {
    level: LogLevel,
    colored: bool,
}

impl ConsoleHandler {
    /// Create a console handler at `level`.
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            colored: false,
        }
    }

    /// Colour messages by level.
    #[must_use]
    pub fn colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// The line this handler would print for `record`.
    #[must_use]
    pub fn format_line(&self, record: &LogRecord) -> String {
        match Color::for_level(record.level).filter(|_| self.colored) {
            Some(color) => text_line(record, &colorize(&record.message, color)),
            None => Formatter::Text.format(record),
        }
    }
}

impl Handler for ConsoleHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Console
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let line = self.format_line(record);
        writeln!(std::io::stderr().lock(), "{line}")?;
        Ok(())
    }
}

/// Appends formatted records to a file.
#[derive(Debug)]
pub struct FileHandler {
    path: PathBuf,
    level: LogLevel,
    formatter: Formatter,
    file: Mutex<File>,
}

impl FileHandler {
    /// Open `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, level: LogLevel, formatter: Formatter) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        Ok(Self {
            path,
            level,
            formatter,
            file: Mutex::new(file),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Handler for FileHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::File
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.format(record);
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| Error::internal("log file lock poisoned"))?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Open a file for appending, creating it if needed.
pub(crate) fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })
}
