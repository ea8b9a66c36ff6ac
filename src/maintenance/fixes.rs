// src/maintenance/fixes.rs
// =============================================================================
// Applies an operator-written URL mapping to the capability records.
//
// Fix file format (JSON object, old URL -> replacement):
//
//   {
//     "https://old.example.com/moved": "https://old.example.com/new-place",
//     "https://old.example.com/page":  {
//       "url": "https://docs.example.com/page#setup",
//       "sourceGranularity": "section"
//     }
//   }
//
// Matching is on the exact cited URL, fragment included. Upgrading a source
// to `dedicated` or `section` drops its `excerpt`.
// =============================================================================

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::{date_stamp, ChangeSet, UrlChange};
use crate::domain::{CapabilityDocument, Granularity};
use crate::error::{GuardianError, Result};
use crate::store::CapabilityStore;

/// One entry of the fix file, in either of its two forms
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FixEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(rename = "sourceGranularity", default)]
        granularity: Option<Granularity>,
    },
}

/// A normalized replacement
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub url: String,
    pub granularity: Option<Granularity>,
}

impl From<FixEntry> for Fix {
    fn from(entry: FixEntry) -> Self {
        match entry {
            FixEntry::Url(url) => Fix { url, granularity: None },
            FixEntry::Detailed { url, granularity } => Fix { url, granularity },
        }
    }
}

/// Reads a fix file. Missing or malformed files are fatal.
pub fn load_fixes(path: &Path) -> Result<HashMap<String, Fix>> {
    if !path.is_file() {
        return Err(GuardianError::FixFileNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| GuardianError::io(path, e))?;
    let entries: HashMap<String, FixEntry> =
        serde_json::from_str(&raw).map_err(|source| GuardianError::InvalidFixFile {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(entries.into_iter().map(|(old, entry)| (old, Fix::from(entry))).collect())
}

/// Applies the fixes to one record. In a dry run nothing is modified.
pub fn apply_fix_map(
    document: &mut CapabilityDocument,
    fixes: &HashMap<String, Fix>,
    today: NaiveDate,
    dry_run: bool,
) -> Vec<UrlChange> {
    let mut changes = Vec::new();

    for capability in &mut document.capabilities {
        for source in &mut capability.sources {
            let Some(fix) = fixes.get(&source.url) else { continue };

            changes.push(UrlChange {
                capability: capability.name.clone(),
                old_url: source.url.clone(),
                new_url: fix.url.clone(),
                granularity_change: fix.granularity.clone(),
            });
            if dry_run {
                continue;
            }

            source.url = fix.url.clone();
            source.verified_date = Some(Some(date_stamp(today)));
            if let Some(granularity) = &fix.granularity {
                source.granularity = Some(Some(granularity.clone()));
                if matches!(granularity, Granularity::Dedicated | Granularity::Section) {
                    source.excerpt = None;
                }
            }
        }
    }

    changes
}

/// Applies the fixes to every subject's record.
pub fn apply_fixes(
    capabilities: &CapabilityStore,
    subjects: &[String],
    fixes: &HashMap<String, Fix>,
    today: NaiveDate,
    dry_run: bool,
) -> Result<ChangeSet> {
    let mut all_changes = ChangeSet::new();

    for subject in subjects {
        let Some(mut document) = capabilities.load(subject)? else {
            continue;
        };
        let changes = apply_fix_map(&mut document, fixes, today, dry_run);
        if !changes.is_empty() && !dry_run {
            capabilities.save(subject, &document)?;
        }
        all_changes.insert(subject.clone(), changes);
    }

    Ok(all_changes)
}
