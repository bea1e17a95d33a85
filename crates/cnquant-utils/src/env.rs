//! Typed lookups of environment variables.
//!
//! CnQuant apps read their data directories and tuning knobs from the
//! environment (usually populated from a `.env` file). Lookup failures are
//! printed to stdout and logged before being returned, so they show up both
//! in container output and in the app log.

use std::path::PathBuf;

use tracing::error;

use crate::error::{Error, Result};

/// Fallback used by apps for integer settings such as timeouts in seconds.
pub const DEFAULT_INTEGER: i64 = 300;

/// Read `name` as a path that must exist.
///
/// # Errors
///
/// Returns [`Error::EnvVarNotSet`] if the variable is unset or not valid
/// Unicode, or [`Error::EnvPathMissing`] if the path does not exist.
pub fn get_path_from_env(name: &str) -> Result<PathBuf> {
    let value = get_string_from_env(name)?;
    let path = PathBuf::from(value);
    if !path.exists() {
        let err = Error::EnvPathMissing { path };
        println!("{err}");
        error!("{err}");
        return Err(err);
    }
    Ok(path)
}

/// Read `name` as an integer, falling back to `default_value`.
///
/// Unset and unparsable values are logged and replaced by the default.
#[must_use]
pub fn get_integer_from_env(name: &str, default_value: i64) -> i64 {
    let value = std::env::var(name).ok();
    match value.as_deref().map(|v| v.trim().parse::<i64>()) {
        Some(Ok(parsed)) => parsed,
        _ => {
            error!(
                "Error: {name} environment variable '{}' is not a valid integer. Defaulting to {default_value}.",
                value.as_deref().unwrap_or("None")
            );
            default_value
        }
    }
}

/// Read `name` as a string.
///
/// # Errors
///
/// Returns [`Error::EnvVarNotSet`] if the variable is unset or not valid
/// Unicode.
pub fn get_string_from_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        let err = Error::EnvVarNotSet {
            name: name.to_string(),
        };
        println!("{err}");
        error!("{err}");
        err
    })
}
