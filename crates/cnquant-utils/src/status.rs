//! Analysis status files.
//!
//! Each analysis writes a small JSON object of boolean flags (for example
//! `{"cnv_done": true}`) next to its results. Readers never fail: anything
//! unreadable counts as "not done".

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{Error, Result};

/// Read the flag `entry` from the status file at `path`.
///
/// Returns `false` if the file is missing, unreadable, not a JSON object, or
/// lacks the entry. Otherwise returns the truthiness of the entry: `false`,
/// `null`, `0`, `""`, `[]` and `{}` are false.
#[must_use]
pub fn load_analysis_status(path: impl AsRef<Path>, entry: &str) -> bool {
    let path = path.as_ref();
    if !path.exists() {
        return false;
    }
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("IOError occurred when reading file {}: {e}", path.display());
            return false;
        }
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map.get(entry).is_some_and(is_truthy),
        Ok(other) => {
            error!(
                "Unexpected error when processing {}: expected a JSON object, found {}",
                path.display(),
                kind(&other)
            );
            false
        }
        Err(_) => {
            error!("Error decoding JSON from file: {}", path.display());
            false
        }
    }
}

/// Set the flag `entry` in the status file at `path`.
///
/// Other entries are preserved. The file and its parent directories are
/// created when missing; an unreadable existing file is replaced.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_analysis_status(path: impl AsRef<Path>, entry: &str, value: bool) -> Result<()> {
    let path = path.as_ref();
    let mut map = match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            _ => {
                debug!("Replacing unreadable status file {}", path.display());
                Map::new()
            }
        },
        Err(_) => Map::new(),
    };
    map.insert(entry.to_string(), Value::Bool(value));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    std::fs::write(path, serde_json::to_vec_pretty(&Value::Object(map))?)?;
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
