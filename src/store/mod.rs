// src/store/mod.rs
// =============================================================================
// File-backed storage.
//
// Layout under the data directory, one folder per subject:
//
//   <data-dir>/<subject>/capabilities/current.json   capability record
//   <data-dir>/<subject>/verification/<pass>.json    latest pass results
//
// Submodules:
// - capabilities: Loads and rewrites capability records
// - results: Persists and reloads per-pass results
//
// All writes go to a temp file first and are renamed into place, so a failed
// write leaves the previous file intact.
// =============================================================================

mod capabilities;
mod results;

pub use capabilities::CapabilityStore;
pub use results::{PassName, PassReport, ResultStore};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{GuardianError, Result};

/// Reads and parses a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| GuardianError::io(path, e))?;
    serde_json::from_str(&raw).map_err(|e| GuardianError::json(path, e))
}

/// Writes pretty JSON with a trailing newline, via temp file + rename.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GuardianError::io(parent, e))?;
    }

    let mut content = serde_json::to_string_pretty(value).map_err(|e| GuardianError::json(path, e))?;
    content.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|e| GuardianError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| GuardianError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/file.json");

        write_json(&path, &json!({"b": 1, "a": 2})).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with("}\n"));
        // Field order is preserved, not sorted
        assert!(raw.find("\"b\"").unwrap() < raw.find("\"a\"").unwrap());

        let back: serde_json::Value = read_json(&path).unwrap();
        assert_eq!(back["a"], 2);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_read_invalid_json_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json::<serde_json::Value>(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
