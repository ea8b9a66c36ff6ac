// src/checker/relevance.rs
// =============================================================================
// Pass 2: does the cited content still back the claim?
//
// Each cited page is fetched once (GET) and reduced to lower-cased text plus
// its anchor set. Then each source is checked according to its granularity:
//
//   dedicated -> the capability name (or at least half of its significant
//                words) appears in the page text
//   section   -> the URL's #fragment matches an anchor on the page
//   excerpt   -> the quoted excerpt (or its first 50 characters) appears in
//                the whitespace-normalized page text
//
// An unreachable page short-circuits everything: relevant = false with
// `page_reachable = false`.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::distinct_base_urls;
use super::html::extract;
use crate::domain::{CapabilityDocument, Granularity, Source};
use crate::fetch::{Fetch, FetchResult, Method};

/// Words shorter than this many characters (or equal) are not significant
const SIGNIFICANT_WORD_LEN: usize = 3;
/// Fraction of significant words that must appear for a dedicated source
const KEYWORD_THRESHOLD: f64 = 0.5;
/// Length of the excerpt prefix used when the full excerpt does not match
const EXCERPT_PREFIX_CHARS: usize = 50;

/// One source's relevance, as persisted in `relevance.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceRecord {
    pub capability: String,
    pub url: String,
    pub granularity: Granularity,
    pub relevant: bool,
    pub checks: RelevanceChecks,
}

/// The sub-checks that were actually performed.
///
/// Only the fields relevant to the source's granularity are set; anything
/// else a future check wants to report goes in `diagnostics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceChecks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_reachable: Option<bool>,

    // dedicated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_found: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_ratio: Option<f64>,

    // section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_found: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_fragment: Option<bool>,

    // excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_match: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_excerpt: Option<bool>,

    #[serde(flatten)]
    pub diagnostics: BTreeMap<String, Value>,
}

impl RelevanceChecks {
    pub fn is_empty(&self) -> bool {
        *self == RelevanceChecks::default()
    }
}

/// A fetched page, ready for matching
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub reachable: bool,
    /// Extracted text, lower-cased
    pub text: String,
    pub anchors: HashSet<String>,
}

impl Page {
    /// Builds a page from a GET result. An empty body counts as unreachable.
    pub fn from_fetch(result: &FetchResult) -> Self {
        if result.body.is_empty() || !result.is_success() {
            return Page::default();
        }
        let extracted = extract(&result.body);
        Page {
            reachable: true,
            text: extracted.text.to_lowercase(),
            anchors: extracted.anchors,
        }
    }
}

/// Runs the relevance pass over one subject's record.
pub async fn check_relevance<F>(
    fetcher: &F,
    document: &CapabilityDocument,
    concurrency: usize,
) -> Vec<RelevanceRecord>
where
    F: Fetch + ?Sized,
{
    let fetched = super::fetch_all(fetcher, distinct_base_urls(document), Method::Get, concurrency).await;
    let pages: HashMap<String, Page> = fetched
        .iter()
        .map(|(url, result)| (url.clone(), Page::from_fetch(result)))
        .collect();

    let unreachable = Page::default();
    let mut records = Vec::new();
    for capability in &document.capabilities {
        for source in &capability.sources {
            let page = pages.get(source.base_url()).unwrap_or(&unreachable);
            records.push(check_source(&capability.name, source, page));
        }
    }
    records
}

/// Checks one source against its (already fetched) page.
pub fn check_source(capability: &str, source: &Source, page: &Page) -> RelevanceRecord {
    let mut checks = RelevanceChecks::default();

    let relevant = if !page.reachable {
        checks.page_reachable = Some(false);
        false
    } else {
        match source.granularity() {
            Granularity::Dedicated => check_dedicated(capability, page, &mut checks),
            Granularity::Section => check_section(source.fragment(), page, &mut checks),
            Granularity::Excerpt => check_excerpt(source.excerpt(), page, &mut checks),
            // Unrecognised, or not declared at all
            Granularity::Other(_) => false,
        }
    };

    RelevanceRecord {
        capability: capability.to_string(),
        url: source.url.clone(),
        granularity: source.granularity(),
        relevant,
        checks,
    }
}

// The full name, or at least half of its significant words, must be on the
// page ("Editing multiple files" still matches "Multiple File Editing").
fn check_dedicated(capability: &str, page: &Page, checks: &mut RelevanceChecks) -> bool {
    let name = capability.to_lowercase();
    let name_found = page.text.contains(&name);

    let words: Vec<&str> = name
        .split_whitespace()
        .filter(|word| word.chars().count() > SIGNIFICANT_WORD_LEN)
        .collect();
    let ratio = if words.is_empty() {
        1.0
    } else {
        let found = words.iter().filter(|word| page.text.contains(*word)).count();
        found as f64 / words.len() as f64
    };

    checks.name_found = Some(name_found);
    checks.keyword_ratio = Some((ratio * 100.0).round() / 100.0);
    name_found || ratio >= KEYWORD_THRESHOLD
}

// The fragment must name an anchor: exactly, ignoring case, or with
// hyphens written as underscores.
fn check_section(fragment: Option<&str>, page: &Page, checks: &mut RelevanceChecks) -> bool {
    let Some(fragment) = fragment else {
        checks.no_fragment = Some(true);
        return false;
    };

    let lowered = fragment.to_lowercase();
    let underscored = fragment.replace('-', "_");
    let anchor_found = page.anchors.contains(fragment)
        || page.anchors.iter().any(|anchor| anchor.to_lowercase() == lowered)
        || page.anchors.contains(&underscored);

    checks.anchor_found = Some(anchor_found);
    checks.fragment = Some(fragment.to_string());
    anchor_found
}

// The excerpt must still be quoted on the page; its first 50 characters
// alone are enough.
fn check_excerpt(excerpt: Option<&str>, page: &Page, checks: &mut RelevanceChecks) -> bool {
    let excerpt = match excerpt {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            checks.no_excerpt = Some(true);
            return false;
        }
    };

    let wanted = normalize_whitespace(&excerpt.to_lowercase());
    let haystack = normalize_whitespace(&page.text);

    let exact = haystack.contains(&wanted);
    let prefix: String = wanted.chars().take(EXCERPT_PREFIX_CHARS).collect();
    let prefix_found = haystack.contains(&prefix);

    checks.exact_match = Some(exact);
    checks.prefix_match = Some(prefix_found);
    exact || prefix_found
}

/// Collapses every run of whitespace into a single space and trims the ends
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
