//! `cnquant` - CLI for cnquant-utils
//!
//! This binary exposes the shared CnQuant utilities on the command line, for
//! use from shell scripts and container entry points.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use cnquant_utils::annotations::{download_annotation_data, HttpFetcher, SheetOutcome};
use cnquant_utils::cli::{
    AnnotationsCommand, Cli, Command, ConfigCommand, CrashReportCommand, EnvCommand, LogCommand,
    StatusCommand, ToolsCommand,
};
use cnquant_utils::project::{validate_index, DISCLAIMER, TOOLS};
use cnquant_utils::{
    env, print_in_color, status, Config, CrashReporter, LogLevel, Logger, LoggerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // These must work even when the configuration itself is broken.
    match &cli.command {
        Command::Config(ConfigCommand::Path) => {
            println!("{}", Config::default_config_path().display());
            return Ok(());
        }
        Command::Config(ConfigCommand::Validate { file }) => {
            return validate_config(file.clone().or_else(|| cli.config.clone()));
        }
        _ => {}
    }

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    let mut logger_config = config.logger_config();
    if let Some(level) = cli.console_level() {
        logger_config.log_level = level.as_str().to_string();
    }
    if let Command::Log(LogCommand {
        log_file: Some(path),
        ..
    }) = &cli.command
    {
        logger_config.log_file = Some(path.clone());
    }
    let logger = init_logger(&logger_config)?;

    let result = run(cli.command, &config, &logger).await;
    logger.stop()?;
    result
}

fn init_logger(config: &LoggerConfig) -> anyhow::Result<Logger> {
    let logger = Logger::new(config).context("failed to set up logging")?;
    logger.install()?;
    Ok(logger)
}

async fn run(command: Command, config: &Config, logger: &Logger) -> anyhow::Result<()> {
    match command {
        Command::Log(cmd) => {
            let level = LogLevel::parse("level", &cmd.level)?;
            logger.log(level, cmd.message);
        }
        Command::Status(cmd) => handle_status(cmd)?,
        Command::Annotations(cmd) => handle_annotations(config, cmd).await?,
        Command::CrashReport(cmd) => handle_crash_report(config, &cmd)?,
        Command::Color(cmd) => print_in_color(&cmd.message, &cmd.color)?,
        Command::Env(cmd) => handle_env(cmd)?,
        Command::Config(cmd) => handle_config(config, &cmd)?,
        Command::Tools(cmd) => handle_tools(&cmd)?,
    }
    Ok(())
}

fn handle_status(cmd: StatusCommand) -> anyhow::Result<()> {
    match cmd {
        StatusCommand::Get { path, entry } => {
            println!("{}", status::load_analysis_status(&path, &entry));
        }
        StatusCommand::Set { path, entry, value } => {
            status::write_analysis_status(&path, &entry, value)?;
        }
    }
    Ok(())
}

async fn handle_annotations(config: &Config, cmd: AnnotationsCommand) -> anyhow::Result<()> {
    let AnnotationsCommand::Download {
        annotation_path,
        reference_path,
    } = cmd;
    let annotations = &config.annotations;
    let annotation_path = annotation_path.unwrap_or_else(|| annotations.annotation_path());
    let reference_path = reference_path.unwrap_or_else(|| annotations.reference_annotation_path());

    let fetcher = HttpFetcher::new()?;
    let report = download_annotation_data(
        &fetcher,
        &annotations.annotation_url,
        &annotations.reference_url,
        &annotation_path,
        &reference_path,
    )
    .await?;

    for (label, outcome) in [
        ("Annotation", &report.annotation),
        ("Reference annotation", &report.reference),
    ] {
        match outcome {
            SheetOutcome::Saved { path, bytes } => {
                println!("{label}: saved {bytes} bytes to {}", path.display());
            }
            SheetOutcome::Failed { status: code } => {
                println!("{label}: failed with status code {code}");
            }
        }
    }
    Ok(())
}

fn handle_crash_report(config: &Config, cmd: &CrashReportCommand) -> anyhow::Result<()> {
    if config.smtp.user.is_empty() || config.smtp.password.is_empty() {
        bail!("smtp.user and smtp.password must be set to send crash reports");
    }
    let app = cmd.app.as_deref().unwrap_or(&config.crash_report.app_name);
    let recipients = cmd.to.as_deref().unwrap_or_else(|| config.crash_recipients());
    let reporter = CrashReporter::from_smtp(app, &config.smtp, recipients)?;
    if !reporter.report(&cmd.message) {
        bail!("crash report for {app} was not sent");
    }
    println!("Crash report for {app} sent.");
    Ok(())
}

fn handle_env(cmd: EnvCommand) -> anyhow::Result<()> {
    match cmd {
        EnvCommand::Path { name } => println!("{}", env::get_path_from_env(&name)?.display()),
        EnvCommand::Int { name, default } => {
            println!("{}", env::get_integer_from_env(&name, default));
        }
        EnvCommand::String { name } => println!("{}", env::get_string_from_env(&name)?),
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                print_config(config);
            }
        }
        ConfigCommand::Path => println!("{}", Config::default_config_path().display()),
        ConfigCommand::Validate { file } => validate_config(file.clone())?,
    }
    Ok(())
}

fn print_config(config: &Config) {
    let logging = &config.logging;
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Logging]");
    println!("  Name:               {}", logging.name);
    match &logging.log_file {
        Some(path) => println!("  Log file:           {}", path.display()),
        None => println!("  Log file:           (none)"),
    }
    println!("  Console level:      {}", logging.log_level);
    println!("  File level:         {}", logging.file_log_level);
    println!("  Email level:        {}", logging.log_level_for_emails);
    println!("  Max file size (MB): {}", logging.max_log_file_size_mb);
    println!("  Backups:            {}", logging.backup_count);
    println!();
    println!("[SMTP]");
    println!("  Host:               {}", config.smtp.host_or_default());
    println!("  Port:               {}", config.smtp.port);
    println!("  User:               {}", config.smtp.user);
    println!("  Password:           {}", config.smtp.redacted_password());
    println!("  Recipients:         {}", config.smtp.email_to);
    println!();
    println!("[Crash report]");
    println!("  App name:           {}", config.crash_report.app_name);
    println!("  Recipients:         {}", config.crash_recipients());
    println!();
    println!("[Annotations]");
    println!(
        "  Annotation file:    {}",
        config.annotations.annotation_path().display()
    );
    println!(
        "  Reference file:     {}",
        config.annotations.reference_annotation_path().display()
    );
}

fn validate_config(file: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => {
            println!("Configuration is valid.");
            Ok(())
        }
        Err(e) => bail!("Configuration error: {e}"),
    }
}

fn handle_tools(cmd: &ToolsCommand) -> anyhow::Result<()> {
    validate_index(TOOLS)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(TOOLS)?);
    } else {
        for tool in TOOLS {
            println!("{:<14} {:<38} {}", tool.name, tool.purpose, tool.url);
        }
    }
    if cmd.disclaimer {
        println!();
        println!("{DISCLAIMER}");
    }
    Ok(())
}
