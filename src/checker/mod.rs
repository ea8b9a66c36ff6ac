// src/checker/mod.rs
// =============================================================================
// This module contains the verification passes.
//
// Submodules:
// - html: Extracts visible text and anchors from HTML pages
// - reachability: Pass 1, HEAD every cited URL
// - relevance: Pass 2, check the cited content still matches the claim
// - semantic: Pass 3, extension point for a model-backed verifier
//
// Every pass works on one subject at a time and never fails: broken links
// become records with reachable/relevant = false.
// =============================================================================

mod html;
mod reachability;
mod relevance;
mod semantic;

pub use reachability::{check_reachability, ReachabilityRecord};
pub use relevance::{check_relevance, RelevanceRecord};
pub use semantic::{check_semantics, SemanticVerifier};

use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use std::collections::{HashMap, HashSet};

use crate::domain::CapabilityDocument;
use crate::fetch::{Fetch, FetchResult, Method};

/// Distinct base URLs (fragment stripped) cited by a document, in first-seen
/// order.
pub(crate) fn distinct_base_urls(document: &CapabilityDocument) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .capabilities
        .iter()
        .flat_map(|capability| capability.sources.iter())
        .map(|source| source.base_url())
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

// Fetches every URL once, up to `concurrency` at a time.
//
// Because the URL list is already deduplicated, each base URL has exactly one
// request in flight no matter how many sources cite it.
pub(crate) async fn fetch_all<F>(
    fetcher: &F,
    urls: Vec<String>,
    method: Method,
    concurrency: usize,
) -> HashMap<String, FetchResult>
where
    F: Fetch + ?Sized,
{
    stream::iter(urls)
        .map(|url| async move {
            let result = fetcher.fetch(&url, method).await;
            (url, result)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}
