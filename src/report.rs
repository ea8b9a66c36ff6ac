// src/report.rs
// =============================================================================
// Human-readable output for every command.
//
// Verification findings are data, not errors: the summaries print PASS/WARN
// per subject and list every failing citation with its error or the checks
// that failed, so nothing is silently dropped.
// =============================================================================

use std::collections::BTreeMap;

use crate::checker::{ReachabilityRecord, RelevanceRecord};
use crate::domain::Granularity;
use crate::maintenance::{BrokenSubject, ChangeSet};
use crate::store::PassName;

/// Longest URL shown on a FAIL line
const URL_DISPLAY_CHARS: usize = 70;

/// What a summary needs to know about one record
pub trait SummaryLine {
    fn passed(&self) -> bool;
    fn capability(&self) -> &str;
    fn url(&self) -> &str;
    /// Extra lines explaining a failure
    fn details(&self) -> Vec<String>;
}

impl SummaryLine for ReachabilityRecord {
    fn passed(&self) -> bool {
        self.reachable
    }

    fn capability(&self) -> &str {
        &self.capability
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn details(&self) -> Vec<String> {
        match &self.error {
            Some(error) => vec![format!("Error: {}", error)],
            None => vec![format!("Status: {}", self.status_code)],
        }
    }
}

impl SummaryLine for RelevanceRecord {
    fn passed(&self) -> bool {
        self.relevant
    }

    fn capability(&self) -> &str {
        &self.capability
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn details(&self) -> Vec<String> {
        if self.checks.is_empty() {
            return match &self.granularity {
                Granularity::Other(raw) if raw.is_empty() => vec!["Missing sourceGranularity".to_string()],
                granularity => vec![format!("Unrecognised granularity: {}", granularity)],
            };
        }
        let checks = serde_json::to_string(&self.checks).unwrap_or_default();
        vec![format!("Checks: {}", checks)]
    }
}

/// Prints the per-subject summary of one pass
pub fn print_pass_summary<R: SummaryLine>(pass: PassName, results: &BTreeMap<String, Vec<R>>) {
    println!();
    println!("{}", "=".repeat(60));
    println!("  {} Summary", pass);
    println!("{}", "=".repeat(60));

    for (subject, records) in results {
        let passed = records.iter().filter(|r| r.passed()).count();
        let status = if passed == records.len() { "✅ PASS" } else { "⚠️  WARN" };
        println!("  {}: {}/{} {}", subject, passed, records.len(), status);

        for record in records.iter().filter(|r| !r.passed()) {
            println!("    ❌ FAIL: {} -> {}", record.capability(), truncate(record.url(), URL_DISPLAY_CHARS));
            for line in record.details() {
                println!("          {}", line);
            }
        }
    }
}

/// Prints what a redirect repair or fix run changed (or would change)
pub fn print_fix_report(changes: &ChangeSet, dry_run: bool) {
    let total: usize = changes.values().map(Vec::len).sum();
    if total == 0 {
        println!("  No changes needed.");
        return;
    }

    let prefix = if dry_run { "[DRY RUN] Would fix" } else { "Fixed" };
    println!("  {} {} source URL(s):", prefix, total);
    println!();

    for (subject, subject_changes) in changes.iter().filter(|(_, c)| !c.is_empty()) {
        println!("  {}:", subject);
        for change in subject_changes {
            println!("    [{}]", change.capability);
            println!("      - {}", change.old_url);
            println!("      + {}", change.new_url);
            if let Some(granularity) = &change.granularity_change {
                println!("      * sourceGranularity -> {}", granularity);
            }
        }
        println!();
    }
}

/// Prints the broken-source report
pub fn print_broken_report(report: &BTreeMap<String, BrokenSubject>) {
    if report.is_empty() {
        println!("  No broken sources found.");
        return;
    }

    for (subject, broken) in report {
        println!();
        println!("  {} ({} broken):", subject, broken.broken_citations);
        for source in &broken.sources {
            println!("    [{}] {}", source.capability, source.url);
            println!("      Error: {}", source.error);
        }
    }

    println!();
    println!("  To fix: create a fixes.json mapping old -> new URLs and run:");
    println!("    citation-guardian apply-fixes fixes.json");
}

/// Shortens `text` to at most `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
