// src/checker/reachability.rs
// =============================================================================
// Pass 1: is every cited URL still reachable?
//
// How it works:
// 1. Collect the distinct base URLs (fragment stripped) cited by a subject
// 2. HEAD each one once, concurrently (the rate limiter spaces same-domain
//    requests)
// 3. Emit one record per source, in record order, reusing the shared result
//
// Two capabilities citing the same page cost one request.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::distinct_base_urls;
use crate::domain::{split_fragment, CapabilityDocument};
use crate::fetch::{Fetch, FetchResult, Method};

/// One source's reachability, as persisted in `reachability.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachabilityRecord {
    pub capability: String,
    /// The URL exactly as cited (fragment included)
    pub url: String,
    pub status_code: u16,
    pub redirected: bool,
    /// Where the redirect chain ended, when `redirected`
    pub redirect_url: Option<String>,
    pub error: Option<String>,
    pub reachable: bool,
}

impl ReachabilityRecord {
    fn new(capability: &str, url: &str, fetched: &FetchResult) -> Self {
        ReachabilityRecord {
            capability: capability.to_string(),
            url: url.to_string(),
            status_code: fetched.status,
            redirected: fetched.redirected,
            redirect_url: fetched.redirected.then(|| fetched.final_url.clone()),
            error: fetched.error.clone(),
            reachable: fetched.is_success(),
        }
    }

    /// The cited URL without its fragment
    pub fn base_url(&self) -> &str {
        split_fragment(&self.url).0
    }
}

/// Runs the reachability pass over one subject's record.
pub async fn check_reachability<F>(
    fetcher: &F,
    document: &CapabilityDocument,
    concurrency: usize,
) -> Vec<ReachabilityRecord>
where
    F: Fetch + ?Sized,
{
    let fetched: HashMap<String, FetchResult> =
        super::fetch_all(fetcher, distinct_base_urls(document), Method::Head, concurrency).await;

    let mut records = Vec::new();
    for capability in &document.capabilities {
        for source in &capability.sources {
            // Every base URL was fetched above; the default only covers a
            // fetcher that dropped a result
            let result = fetched.get(source.base_url()).cloned().unwrap_or_default();
            records.push(ReachabilityRecord::new(&capability.name, &source.url, &result));
        }
    }
    records
}
