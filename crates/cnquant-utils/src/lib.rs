//! `cnquant-utils` - Shared utilities for the CnQuant copy-number tools
//!
//! This library provides the plumbing the CnQuant apps have in common:
//! leveled logging to console, rotating files and email, crash reports by
//! email, typed environment lookups, analysis status files, and download of
//! the published annotation sheets.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod annotations;
pub mod cli;
pub mod config;
pub mod console;
pub mod crash_report;
pub mod env;
pub mod error;
pub mod level;
pub mod logging;
pub mod mail;
pub mod project;
pub mod status;

pub use annotations::{download_annotation_data, HttpFetcher, SheetFetcher};
pub use config::Config;
pub use console::{print_in_color, Color};
pub use crash_report::{send_crash_email, CrashReport, CrashReporter};
pub use env::{get_integer_from_env, get_path_from_env, get_string_from_env};
pub use error::{Error, Result};
pub use level::LogLevel;
pub use logging::{setup_logger, Logger, LoggerConfig, LoggerMode};
pub use status::load_analysis_status;
