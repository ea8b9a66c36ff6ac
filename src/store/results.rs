// src/store/results.rs
// =============================================================================
// The result store: the latest output of each pass, per subject.
//
// File format (`verification/<pass>.json`):
//
//   {
//     "generated_at": "2026-10-19T08:00:00Z",
//     "pass": "reachability",
//     "results": [ ... one record per source ... ]
//   }
//
// Every run replaces the whole file; there is no merging with older runs.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::info;

use super::{read_json, write_json};
use crate::error::Result;

/// Which pass produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassName {
    Reachability,
    Relevance,
    Semantic,
}

impl PassName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassName::Reachability => "reachability",
            PassName::Relevance => "relevance",
            PassName::Semantic => "semantic",
        }
    }
}

impl fmt::Display for PassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted result set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassReport<T> {
    pub generated_at: DateTime<Utc>,
    pub pass: PassName,
    pub results: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ResultStore { root: root.into() }
    }

    fn path(&self, subject: &str, pass: PassName) -> PathBuf {
        self.root
            .join(subject)
            .join("verification")
            .join(format!("{}.json", pass.as_str()))
    }

    /// Replaces the stored results of `pass` for `subject`, stamped now.
    pub fn save<T: Serialize>(&self, subject: &str, pass: PassName, results: Vec<T>) -> Result<PassReport<T>> {
        let report = PassReport {
            generated_at: Utc::now(),
            pass,
            results,
        };
        let path = self.path(subject, pass);
        write_json(&path, &report)?;
        info!(subject, %pass, path = %path.display(), "Saved results");
        Ok(report)
    }

    /// The last stored results of `pass` for `subject`, if any.
    pub fn load<T: DeserializeOwned>(&self, subject: &str, pass: PassName) -> Result<Option<PassReport<T>>> {
        let path = self.path(subject, pass);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}
