// src/maintenance/mod.rs
// =============================================================================
// Maintenance commands built on top of the verification results.
//
// The workflow is deliberately two-step:
// 1. `verify` saves reachability.json for each subject
// 2. an operator inspects it, then runs one of these:
//    - redirects: rewrite redirected URLs to where they now land
//    - fixes: apply a hand-written old -> new URL mapping
//    - broken: list the distinct endpoints that are down
//
// Only `redirects` and `fixes` write capability records, and neither writes
// anything in dry-run mode.
// =============================================================================

mod broken;
mod fixes;
mod redirects;

pub use broken::{report_broken, BrokenSubject};
pub use fixes::{apply_fixes, load_fixes};
pub use redirects::fix_redirects;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::Granularity;

/// One source URL that was (or in a dry run, would be) rewritten
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlChange {
    pub capability: String,
    pub old_url: String,
    pub new_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity_change: Option<Granularity>,
}

/// Changes per subject, in subject order
pub type ChangeSet = BTreeMap<String, Vec<UrlChange>>;

/// Today's local date, used to stamp `verifiedDate`
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// `verifiedDate` format: `YYYY-MM-DD`
pub(crate) fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
