//! Size-based log file rotation.
//!
//! When the next record would push `app.log` past the size limit, the file
//! becomes `app.log.1`, the old `app.log.1` becomes `app.log.2`, and so on
//! up to the backup count. The oldest backup is discarded.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};
use crate::level::LogLevel;

use super::handler::{open_append, Handler, HandlerKind};
use super::record::{Formatter, LogRecord};

#[derive(Debug)]
struct ActiveFile {
    file: File,
    size: u64,
}

/// Appends records to a file and rotates it by size.
///
/// Rotation is disabled when either `max_bytes` or `backup_count` is zero;
/// the file then grows without bound.
#[derive(Debug)]
pub struct RotatingFileHandler {
    path: PathBuf,
    level: LogLevel,
    formatter: Formatter,
    max_bytes: u64,
    backup_count: usize,
    active: Mutex<ActiveFile>,
}

impl RotatingFileHandler {
    /// Open `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its size read.
    pub fn open(
        path: impl AsRef<Path>,
        level: LogLevel,
        formatter: Formatter,
        max_bytes: u64,
        backup_count: usize,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            level,
            formatter,
            max_bytes,
            backup_count,
            active: Mutex::new(ActiveFile { file, size }),
        })
    }

    /// Path of the active log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size limit in bytes.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Number of rotated files kept.
    #[must_use]
    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    /// Path of backup number `index` (1 is the most recent).
    #[must_use]
    pub fn backup_path(&self, index: usize) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn should_rollover(&self, current: u64, incoming: u64) -> bool {
        self.max_bytes > 0
            && self.backup_count > 0
            && current > 0
            && current + incoming >= self.max_bytes
    }

    fn rollover(&self, active: &mut ActiveFile) -> Result<()> {
        active.file.flush()?;
        for index in (1..self.backup_count).rev() {
            let source = self.backup_path(index);
            if source.exists() {
                let target = self.backup_path(index + 1);
                if target.exists() {
                    fs::remove_file(&target)?;
                }
                fs::rename(&source, &target)?;
            }
        }
        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        fs::rename(&self.path, &first)?;

        active.file = open_append(&self.path)?;
        active.size = 0;
        Ok(())
    }
}

impl Handler for RotatingFileHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::RotatingFile
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.format(record);
        line.push('\n');
        let incoming = line.len() as u64;

        let mut active = self
            .active
            .lock()
            .map_err(|_| Error::internal("log file lock poisoned"))?;
        let rotated = self.should_rollover(active.size, incoming);
        if rotated {
            self.rollover(&mut active)?;
        }
        active.file.write_all(line.as_bytes())?;
        active.file.flush()?;
        active.size += incoming;
        drop(active);

        // Events must not be raised while the file lock is held.
        if rotated {
            debug!("Rotated log file {}", self.path.display());
        }
        Ok(())
    }
}
