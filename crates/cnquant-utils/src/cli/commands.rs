//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{ArgAction, Args, Subcommand};

use crate::env::DEFAULT_INTEGER;

/// Log command arguments.
#[derive(Debug, Args)]
pub struct LogCommand {
    /// Level of the record (debug, info, warning, error, critical)
    #[arg(short, long, default_value = "info")]
    pub level: String,

    /// Override the configured log file
    #[arg(short = 'f', long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// The message to log
    pub message: String,
}

/// Analysis status commands.
#[derive(Debug, Subcommand)]
pub enum StatusCommand {
    /// Print whether an entry of a status file is set
    Get {
        /// Status file
        path: PathBuf,

        /// Entry name (e.g. "cnv_done")
        entry: String,
    },

    /// Set an entry of a status file
    Set {
        /// Status file
        path: PathBuf,

        /// Entry name (e.g. "cnv_done")
        entry: String,

        /// Value to store
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        value: bool,
    },
}

/// Annotation sheet commands.
#[derive(Debug, Subcommand)]
pub enum AnnotationsCommand {
    /// Download the sample and reference annotation sheets
    Download {
        /// Where to save the sample annotation
        #[arg(long, value_name = "FILE")]
        annotation_path: Option<PathBuf>,

        /// Where to save the reference annotation
        #[arg(long, value_name = "FILE")]
        reference_path: Option<PathBuf>,
    },
}

/// Crash report command arguments.
#[derive(Debug, Args)]
pub struct CrashReportCommand {
    /// Application that crashed (defaults to crash_report.app_name)
    #[arg(short, long)]
    pub app: Option<String>,

    /// Recipients, comma separated (defaults to the configured ones)
    #[arg(short, long)]
    pub to: Option<String>,

    /// Error message or stack trace
    pub message: String,
}

/// Color command arguments.
#[derive(Debug, Args)]
pub struct ColorCommand {
    /// One of: white, green, red, blue, yellow, magenta, cyan
    pub color: String,

    /// The message to print
    pub message: String,
}

/// Environment lookup commands.
#[derive(Debug, Subcommand)]
pub enum EnvCommand {
    /// Print a variable holding an existing path
    Path {
        /// Variable name
        name: String,
    },

    /// Print a variable as an integer
    Int {
        /// Variable name
        name: String,

        /// Value used when the variable is unset or invalid
        #[arg(short, long, default_value_t = DEFAULT_INTEGER, allow_negative_numbers = true)]
        default: i64,
    },

    /// Print a variable as a string
    String {
        /// Variable name
        name: String,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration file
    Validate {
        /// Path to config file to validate
        file: Option<PathBuf>,
    },
}

/// Tools command arguments.
#[derive(Debug, Args)]
pub struct ToolsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Also print the usage disclaimer
    #[arg(short, long)]
    pub disclaimer: bool,
}
