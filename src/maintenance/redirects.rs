// src/maintenance/redirects.rs
// =============================================================================
// Redirect repair: rewrite cited URLs to their canonical post-redirect form.
//
// Input is the last saved reachability run, not a fresh fetch, so what gets
// rewritten is exactly what the operator could inspect beforehand.
//
// Fragment policy, kept as-is:
// - Cited `https://old/doc#setup` redirecting to `https://new/doc` becomes
//   `https://new/doc#setup`; the map key is the full cited URL.
// - If the redirect target carries its own fragment, that one wins and the
//   cited fragment is dropped.
// - Cited without a fragment: the key is the base URL.
// =============================================================================

use chrono::NaiveDate;
use std::collections::HashMap;

use super::{date_stamp, ChangeSet, UrlChange};
use crate::checker::ReachabilityRecord;
use crate::domain::{split_fragment, CapabilityDocument};
use crate::error::Result;
use crate::store::{CapabilityStore, PassName, PassReport, ResultStore};

/// Old URL -> canonical URL, from the redirected records of one run.
pub fn build_redirect_map(records: &[ReachabilityRecord]) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for record in records {
        let target = match (&record.redirect_url, record.redirected) {
            (Some(target), true) => target,
            _ => continue,
        };

        let (base, fragment) = split_fragment(&record.url);
        match fragment {
            Some(fragment) if !target.contains('#') => {
                map.insert(record.url.clone(), format!("{}#{}", target, fragment));
            }
            Some(_) => {
                map.insert(record.url.clone(), target.clone());
            }
            None => {
                map.insert(base.to_string(), target.clone());
            }
        }
    }

    map
}

/// Applies a redirect map to one record. In a dry run nothing is modified.
pub fn apply_redirect_map(
    document: &mut CapabilityDocument,
    redirects: &HashMap<String, String>,
    today: NaiveDate,
    dry_run: bool,
) -> Vec<UrlChange> {
    let mut changes = Vec::new();

    for capability in &mut document.capabilities {
        for source in &mut capability.sources {
            let new_url = redirects
                .get(&source.url)
                .or_else(|| redirects.get(source.base_url()));

            let Some(new_url) = new_url else { continue };
            if *new_url == source.url {
                continue;
            }

            changes.push(UrlChange {
                capability: capability.name.clone(),
                old_url: source.url.clone(),
                new_url: new_url.clone(),
                granularity_change: None,
            });
            if !dry_run {
                source.url = new_url.clone();
                source.verified_date = Some(Some(date_stamp(today)));
            }
        }
    }

    changes
}

/// Runs redirect repair for every subject.
///
/// Returns `None` when no subject has saved reachability results.
pub fn fix_redirects(
    capabilities: &CapabilityStore,
    results: &ResultStore,
    subjects: &[String],
    today: NaiveDate,
    dry_run: bool,
) -> Result<Option<ChangeSet>> {
    let mut all_changes = ChangeSet::new();
    let mut found_results = false;

    for subject in subjects {
        let report: Option<PassReport<ReachabilityRecord>> = results.load(subject, PassName::Reachability)?;
        let Some(report) = report else { continue };
        found_results = true;

        let redirects = build_redirect_map(&report.results);
        if redirects.is_empty() {
            continue;
        }
        let Some(mut document) = capabilities.load(subject)? else {
            continue;
        };

        let changes = apply_redirect_map(&mut document, &redirects, today, dry_run);
        if !changes.is_empty() && !dry_run {
            capabilities.save(subject, &document)?;
        }
        all_changes.insert(subject.clone(), changes);
    }

    Ok(found_results.then_some(all_changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::tests::document;

    fn redirect(url: &str, target: &str) -> ReachabilityRecord {
        ReachabilityRecord {
            capability: "Claim".to_string(),
            url: url.to_string(),
            status_code: 200,
            redirected: true,
            redirect_url: Some(target.to_string()),
            error: None,
            reachable: true,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_map_keys_and_fragment_policy() {
        let map = build_redirect_map(&[
            redirect("https://old/plain", "https://new/plain"),
            redirect("https://old/doc#setup", "https://new/doc"),
            redirect("https://old/page#mine", "https://new/page#theirs"),
        ]);

        assert_eq!(map["https://old/plain"], "https://new/plain");
        assert_eq!(map["https://old/doc#setup"], "https://new/doc#setup");
        // Documented policy: the destination's own fragment takes precedence
        assert_eq!(map["https://old/page#mine"], "https://new/page#theirs");
        assert!(!map.contains_key("https://old/doc"));
    }

    #[test]
    fn test_records_without_redirect_are_ignored() {
        let mut record = redirect("https://old/plain", "https://new/plain");
        record.redirected = false;
        assert!(build_redirect_map(&[record]).is_empty());
    }

    #[test]
    fn test_rewrites_url_and_stamps_date() {
        let mut doc = document(&[
            ("Moved", "https://old/plain", "dedicated", None),
            ("Untouched", "https://other/page", "dedicated", None),
        ]);
        let map = build_redirect_map(&[redirect("https://old/plain", "https://new/plain")]);

        let changes = apply_redirect_map(&mut doc, &map, day(), false);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_url, "https://old/plain");
        assert_eq!(changes[0].new_url, "https://new/plain");

        let moved = &doc.capabilities[0].sources[0];
        assert_eq!(moved.url, "https://new/plain");
        assert_eq!(moved.verified_date(), Some("2026-10-19"));

        let untouched = &doc.capabilities[1].sources[0];
        assert_eq!(untouched.verified_date(), Some("2025-01-01"));
    }

    #[test]
    fn test_fragment_less_redirect_also_matches_cited_fragments_by_base() {
        let mut doc = document(&[("Section", "https://old/plain#part", "section", None)]);
        let map = build_redirect_map(&[redirect("https://old/plain", "https://new/plain")]);

        let changes = apply_redirect_map(&mut doc, &map, day(), false);
        assert_eq!(changes[0].new_url, "https://new/plain");
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let mut doc = document(&[("Moved", "https://old/plain", "dedicated", None)]);
        let map = build_redirect_map(&[redirect("https://old/plain", "https://new/plain")]);

        let changes = apply_redirect_map(&mut doc, &map, day(), true);
        assert_eq!(changes.len(), 1);
        assert_eq!(doc.capabilities[0].sources[0].url, "https://old/plain");
        assert_eq!(doc.capabilities[0].sources[0].verified_date(), Some("2025-01-01"));
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let mut doc = document(&[
            ("Moved", "https://old/plain", "dedicated", None),
            ("Section", "https://old/doc#setup", "section", None),
        ]);
        let map = build_redirect_map(&[
            redirect("https://old/plain", "https://new/plain"),
            redirect("https://old/doc#setup", "https://new/doc"),
        ]);

        assert_eq!(apply_redirect_map(&mut doc, &map, day(), false).len(), 2);
        assert!(apply_redirect_map(&mut doc, &map, day(), false).is_empty());
    }
}
