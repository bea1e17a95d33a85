//! Configuration management for cnquant-utils.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::fmt;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::annotations::{DATA_ANNOTATION_SHEET, REFERENCE_DATA_ANNOTATION_SHEET};
use crate::error::{Error, Result};
use crate::logging::LoggerConfig;
use crate::mail::{DEFAULT_SMTP_HOST, DEFAULT_SMTP_PORT};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "cnquant";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "CNQUANT_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CNQUANT_`, sections separated
///    by `__`, e.g. `CNQUANT_SMTP__PASSWORD`)
/// 2. TOML config file at `~/.config/cnquant/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logger configuration.
    pub logging: LoggerConfig,
    /// SMTP relay shared by log notifications and crash reports.
    pub smtp: SmtpConfig,
    /// Crash report configuration.
    pub crash_report: CrashReportConfig,
    /// Annotation sheet configuration.
    pub annotations: AnnotationsConfig,
}

/// SMTP relay settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host. Empty disables log notifications.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Login user, also used as the sender address.
    pub user: String,
    /// Login password or app password. Never serialized.
    #[serde(skip_serializing)]
    pub password: String,
    /// Comma- or semicolon-separated recipients.
    pub email_to: String,
}

/// Crash report settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashReportConfig {
    /// Application name used in the subject and body.
    pub app_name: String,
    /// Recipients overriding `smtp.email_to`.
    pub recipients: Option<String>,
}

/// Annotation sheet settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationsConfig {
    /// CSV export of the sample annotation sheet.
    pub annotation_url: String,
    /// CSV export of the reference annotation sheet.
    pub reference_url: String,
    /// Where the sample annotation is saved.
    /// Defaults to `~/.local/share/cnquant/annotations/annotation.csv`
    pub annotation_path: Option<PathBuf>,
    /// Where the reference annotation is saved.
    /// Defaults to `~/.local/share/cnquant/annotations/reference_annotation.csv`
    pub reference_annotation_path: Option<PathBuf>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SMTP_PORT,
            user: String::new(),
            password: String::new(),
            email_to: String::new(),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.redacted_password())
            .field("email_to", &self.email_to)
            .finish()
    }
}

impl SmtpConfig {
    /// Whether host, user, password and recipients are all set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.host, &self.user, &self.password, &self.email_to]
            .iter()
            .all(|value| !value.trim().is_empty())
    }

    /// The host, falling back to the default relay when empty.
    #[must_use]
    pub fn host_or_default(&self) -> &str {
        if self.host.trim().is_empty() {
            DEFAULT_SMTP_HOST
        } else {
            &self.host
        }
    }

    /// Password shown as `***` when set.
    #[must_use]
    pub fn redacted_password(&self) -> &'static str {
        if self.password.is_empty() {
            ""
        } else {
            "***"
        }
    }
}

impl Default for CrashReportConfig {
    fn default() -> Self {
        Self {
            app_name: "cnquant".to_string(),
            recipients: None,
        }
    }
}

impl Default for AnnotationsConfig {
    fn default() -> Self {
        Self {
            annotation_url: DATA_ANNOTATION_SHEET.to_string(),
            reference_url: REFERENCE_DATA_ANNOTATION_SHEET.to_string(),
            annotation_path: None,
            reference_annotation_path: None,
        }
    }
}

impl AnnotationsConfig {
    /// Sample annotation target, resolving defaults if not set.
    #[must_use]
    pub fn annotation_path(&self) -> PathBuf {
        self.annotation_path
            .clone()
            .unwrap_or_else(|| Config::default_data_dir().join("annotations").join("annotation.csv"))
    }

    /// Reference annotation target, resolving defaults if not set.
    #[must_use]
    pub fn reference_annotation_path(&self) -> PathBuf {
        self.reference_annotation_path.clone().unwrap_or_else(|| {
            Config::default_data_dir()
                .join("annotations")
                .join("reference_annotation.csv")
        })
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.logging.validate()?;

        if self.logging.rotate_file == Some(true) && self.logging.max_log_file_size_mb == 0 {
            return Err(Error::config_validation(
                "max_log_file_size_mb must be greater than 0 when rotation is enabled",
            ));
        }

        if self.smtp.port == 0 {
            return Err(Error::config_validation("smtp port must be greater than 0"));
        }

        for (name, url) in [
            ("annotation_url", &self.annotations.annotation_url),
            ("reference_url", &self.annotations.reference_url),
        ] {
            if !url.starts_with("https://") {
                return Err(Error::config_validation(format!(
                    "{name} must be an https URL: {url}"
                )));
            }
        }

        Ok(())
    }

    /// Logger settings with the shared SMTP section filled in.
    #[must_use]
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            smtp: self.smtp.clone(),
            ..self.logging.clone()
        }
    }

    /// Crash report recipients, falling back to `smtp.email_to`.
    #[must_use]
    pub fn crash_recipients(&self) -> &str {
        self.crash_report
            .recipients
            .as_deref()
            .unwrap_or(&self.smtp.email_to)
    }
}
