// src/fetch/mod.rs
// =============================================================================
// Rate-limited HTTP fetching.
//
// Submodules:
// - http: The `Fetch` trait and the reqwest-backed `HttpFetcher`
// - rate_limit: Per-domain spacing of requests, with an injectable clock
// =============================================================================

mod http;
mod rate_limit;

pub use http::{Fetch, FetchConfig, FetchResult, HttpFetcher, Method};
pub use rate_limit::{RateLimiter, SystemClock};
