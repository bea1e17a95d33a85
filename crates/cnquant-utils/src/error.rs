//! Error types for cnquant-utils.
//!
//! This module defines all error types used throughout the crate, providing
//! detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cnquant-utils operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Logging Errors ===
    /// A log level string was not recognised.
    #[error("{option} must be one of: none, debug, info, warning, error, critical. Got: {value}")]
    InvalidLogLevel {
        /// Which setting carried the bad value (e.g. `log_level`).
        option: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A log directory that must already exist is missing.
    #[error("log directory {path} does not exist")]
    LogDirectoryMissing {
        /// The missing directory.
        path: PathBuf,
    },

    /// Installing the global tracing subscriber failed.
    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),

    // === Console Errors ===
    /// A colour name was not recognised.
    #[error("Invalid color: {color}. Available colors: white, green, red, blue, yellow, magenta, cyan")]
    InvalidColor {
        /// The rejected colour name.
        color: String,
    },

    // === Environment Errors ===
    /// A required environment variable is not set.
    #[error("Error: {name} environment variable not set!")]
    EnvVarNotSet {
        /// Name of the variable.
        name: String,
    },

    /// An environment variable points at a path that does not exist.
    #[error("Path set in .env file {} does not exist.", .path.display())]
    EnvPathMissing {
        /// The path read from the variable.
        path: PathBuf,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Mail Errors ===
    /// An email address could not be parsed.
    #[error("invalid email address '{address}': {message}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// Why it was rejected.
        message: String,
    },

    /// Building or sending an email failed.
    #[error("mail error: {0}")]
    Mail(String),

    // === Network Errors ===
    /// An HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to open a file for writing.
    #[error("failed to open {path}: {source}")]
    FileOpen {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for cnquant-utils operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<lettre::error::Error> for Error {
    fn from(err: lettre::error::Error) -> Self {
        Self::Mail(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for Error {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Mail(err.to_string())
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new mail error.
    #[must_use]
    pub fn mail(message: impl Into<String>) -> Self {
        Self::Mail(message.into())
    }

    /// Create an invalid log level error for the named setting.
    #[must_use]
    pub fn invalid_log_level(option: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidLogLevel {
            option,
            value: value.into(),
        }
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error comes from a missing or invalid environment variable.
    #[must_use]
    pub fn is_env_error(&self) -> bool {
        matches!(self, Self::EnvVarNotSet { .. } | Self::EnvPathMissing { .. })
    }

    /// Check if this error is a mail delivery or address problem.
    #[must_use]
    pub fn is_mail_error(&self) -> bool {
        matches!(self, Self::Mail(_) | Self::InvalidAddress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_log_level_display() {
        let err = Error::invalid_log_level("log_level", "loud");
        assert_eq!(
            err.to_string(),
            "log_level must be one of: none, debug, info, warning, error, critical. Got: loud"
        );
    }

    #[test]
    fn test_invalid_color_display() {
        let err = Error::InvalidColor {
            color: "purple".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Invalid color: purple."));
        assert!(msg.contains("magenta"));
    }

    #[test]
    fn test_env_var_not_set_display() {
        let err = Error::EnvVarNotSet {
            name: "DATA_DIR".to_string(),
        };
        assert_eq!(err.to_string(), "Error: DATA_DIR environment variable not set!");
        assert!(err.is_env_error());
    }

    #[test]
    fn test_env_path_missing_display() {
        let err = Error::EnvPathMissing {
            path: PathBuf::from("/no/such/dir"),
        };
        assert_eq!(
            err.to_string(),
            "Path set in .env file /no/such/dir does not exist."
        );
        assert!(err.is_env_error());
    }

    #[test]
    fn test_mail_error_predicates() {
        assert!(Error::mail("connection refused").is_mail_error());
        let err = Error::InvalidAddress {
            address: "nobody".to_string(),
            message: "missing domain".to_string(),
        };
        assert!(err.is_mail_error());
        assert!(!Error::internal("x").is_mail_error());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::config_validation("max_log_file_size_mb must be greater than 0");
        assert!(err.to_string().contains("max_log_file_size_mb"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_log_directory_missing_display() {
        let err = Error::LogDirectoryMissing {
            path: PathBuf::from("/var/log/cnquant"),
        };
        assert!(err.to_string().contains("/var/log/cnquant"));
    }
}
