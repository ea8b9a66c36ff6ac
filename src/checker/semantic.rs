// src/checker/semantic.rs
// =============================================================================
// Pass 3: semantic verification.
//
// The keyword/anchor/excerpt checks of pass 2 cannot tell whether a page
// actually SUPPORTS a claim, only that it mentions it. Pass 3 is where a
// model-backed verifier reads the page text and judges the claim.
//
// No verifier ships with this crate. Plug one in by implementing
// `SemanticVerifier`; without one the pass is skipped with a warning.
// =============================================================================

use async_trait::async_trait;
use tracing::warn;

use super::distinct_base_urls;
use super::relevance::{Page, RelevanceRecord};
use crate::domain::{CapabilityDocument, Source};
use crate::fetch::{Fetch, Method};

#[async_trait]
pub trait SemanticVerifier: Send + Sync {
    /// Judges whether `page` substantiates `capability` as cited by `source`
    async fn verify(&self, capability: &str, source: &Source, page: &Page) -> RelevanceRecord;
}

/// Runs pass 3 for one subject.
///
/// Returns `None` when no verifier is configured, so callers don't persist
/// an empty result set over a previous run.
pub async fn check_semantics<F>(
    verifier: Option<&dyn SemanticVerifier>,
    fetcher: &F,
    subject: &str,
    document: &CapabilityDocument,
    concurrency: usize,
) -> Option<Vec<RelevanceRecord>>
where
    F: Fetch + ?Sized,
{
    let Some(verifier) = verifier else {
        warn!(subject, "Semantic verification is not configured; skipping pass 3");
        return None;
    };

    let fetched = super::fetch_all(fetcher, distinct_base_urls(document), Method::Get, concurrency).await;
    let unreachable = Page::default();

    let mut records = Vec::new();
    for capability in &document.capabilities {
        for source in &capability.sources {
            let page = fetched
                .get(source.base_url())
                .map(Page::from_fetch)
                .unwrap_or_else(|| unreachable.clone());
            records.push(verifier.verify(&capability.name, source, &page).await);
        }
    }
    Some(records)
}
