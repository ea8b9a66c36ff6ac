// src/error.rs
// =============================================================================
// Typed errors for everything that can abort an invocation.
//
// Only data problems live here: unreadable record files, a broken fix file,
// an HTTP client that could not be built. Per-URL failures (404s, timeouts,
// DNS errors) are NOT errors - they are findings recorded in the results.
// =============================================================================

use std::path::PathBuf;

/// Result type alias for store and maintenance operations.
pub type Result<T> = std::result::Result<T, GuardianError>;

#[derive(Debug, thiserror::Error)]
pub enum GuardianError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("fixes file not found: {0}")]
    FixFileNotFound(PathBuf),

    #[error("Invalid fixes file {path}: {source}")]
    InvalidFixFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl GuardianError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GuardianError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        GuardianError::Json {
            path: path.into(),
            source,
        }
    }
}
