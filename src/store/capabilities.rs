// src/store/capabilities.rs
// =============================================================================
// Access to the capability records, one JSON document per subject.
//
// The records belong to other tools. We read them for every pass and only
// write them back from the maintenance commands (redirect repair, fixes).
// =============================================================================

use std::fs;
use std::path::PathBuf;
use tracing::info;

use super::{read_json, write_json};
use crate::domain::CapabilityDocument;
use crate::error::{GuardianError, Result};

#[derive(Debug, Clone)]
pub struct CapabilityStore {
    root: PathBuf,
}

impl CapabilityStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CapabilityStore { root: root.into() }
    }

    fn path(&self, subject: &str) -> PathBuf {
        self.root.join(subject).join("capabilities").join("current.json")
    }

    /// Every subject that has a capability record, sorted by slug.
    ///
    /// A missing data directory simply has no subjects.
    pub fn subjects(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GuardianError::io(&self.root, e)),
        };

        let mut subjects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GuardianError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir() && self.path(&name).is_file() {
                subjects.push(name);
            }
        }
        subjects.sort();
        Ok(subjects)
    }

    /// Loads a subject's record; `None` when the subject has no record.
    pub fn load(&self, subject: &str) -> Result<Option<CapabilityDocument>> {
        let path = self.path(subject);
        if !path.is_file() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Rewrites a subject's record in full.
    pub fn save(&self, subject: &str, document: &CapabilityDocument) -> Result<()> {
        let path = self.path(subject);
        write_json(&path, document)?;
        info!(subject, path = %path.display(), "Updated capability record");
        Ok(())
    }
}
