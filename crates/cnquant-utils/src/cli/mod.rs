//! Command-line interface for cnquant-utils.
//!
//! This module provides the CLI structure for the `cnquant` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::level::LogLevel;

pub use commands::{
    AnnotationsCommand, ColorCommand, ConfigCommand, CrashReportCommand, EnvCommand, LogCommand,
    StatusCommand, ToolsCommand,
};

/// cnquant - Utilities shared by the CnQuant copy-number tools
///
/// Log through the shared logger, send crash reports, inspect analysis
/// status files and download the annotation sheets.
#[derive(Debug, Parser)]
#[command(name = "cnquant")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a record through the configured logger
    Log(LogCommand),

    /// Read or write analysis status files
    #[command(subcommand)]
    Status(StatusCommand),

    /// Manage the annotation sheets
    #[command(subcommand)]
    Annotations(AnnotationsCommand),

    /// Send a crash report email
    CrashReport(CrashReportCommand),

    /// Print a message in color
    Color(ColorCommand),

    /// Look up environment variables
    #[command(subcommand)]
    Env(EnvCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// List the CnQuant tools
    Tools(ToolsCommand),
}

impl Cli {
    /// Console level requested by flags, overriding the configured one.
    #[must_use]
    pub fn console_level(&self) -> Option<LogLevel> {
        if self.quiet {
            Some(LogLevel::Error)
        } else if self.verbose > 0 {
            Some(LogLevel::Debug)
        } else {
            None
        }
    }
}
