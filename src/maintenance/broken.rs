// src/maintenance/broken.rs
// =============================================================================
// Lists broken sources from the last reachability run.
//
// "Broken" means unreachable AND carrying a fetch error. Ten capabilities
// citing the same dead page show up once, keyed by base URL, so the operator
// sees distinct endpoints to fix.
// =============================================================================

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::checker::ReachabilityRecord;
use crate::error::Result;
use crate::store::{PassName, PassReport, ResultStore};

/// A distinct broken endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenSource {
    /// First capability that cites it
    pub capability: String,
    /// Base URL (fragment stripped)
    pub url: String,
    pub error: String,
}

/// Broken sources of one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenSubject {
    /// Broken citations before deduplication
    pub broken_citations: usize,
    pub sources: Vec<BrokenSource>,
}

/// Picks the broken citations out of a run, deduplicated by base URL.
pub fn broken_sources(records: &[ReachabilityRecord]) -> BrokenSubject {
    let broken: Vec<&ReachabilityRecord> = records
        .iter()
        .filter(|record| !record.reachable && record.error.is_some())
        .collect();

    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for record in &broken {
        let url = record.base_url();
        if !seen.insert(url) {
            continue;
        }
        sources.push(BrokenSource {
            capability: record.capability.clone(),
            url: url.to_string(),
            error: record.error.clone().unwrap_or_default(),
        });
    }

    BrokenSubject {
        broken_citations: broken.len(),
        sources,
    }
}

/// Collects broken sources for every subject with saved results.
///
/// Returns `None` when no subject has saved reachability results. Subjects
/// without broken sources are left out.
pub fn report_broken(results: &ResultStore, subjects: &[String]) -> Result<Option<BTreeMap<String, BrokenSubject>>> {
    let mut report = BTreeMap::new();
    let mut found_results = false;

    for subject in subjects {
        let saved: Option<PassReport<ReachabilityRecord>> = results.load(subject, PassName::Reachability)?;
        let Some(saved) = saved else { continue };
        found_results = true;

        let broken = broken_sources(&saved.results);
        if broken.broken_citations > 0 {
            report.insert(subject.clone(), broken);
        }
    }

    Ok(found_results.then_some(report))
}
