// src/fetch/http.rs
// =============================================================================
// This module fetches URLs over HTTP.
//
// Key functionality:
// - HEAD requests for reachability (no body download)
// - GET requests for relevance (body decoded to text)
// - Redirects are followed; we report where we ended up
// - Failures are categorized (timeout, DNS, SSL, ...) and returned as data
//
// A fetch never returns Err. Callers branch on `status`:
//   0        = transport failure (DNS, connection refused, timeout)
//   400..    = HTTP error, `error` holds "HTTP Error <code>: <reason>"
//
// Rust concepts:
// - async_trait: Async methods on a trait we can mock in tests
// - Arc: The rate limiter is shared between the fetcher and its clones
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as _;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

use super::rate_limit::RateLimiter;
use crate::error::Result;

/// Which HTTP method to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Status only, used for reachability
    Head,
    /// Status and body, used for relevance
    Get,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Head => f.write_str("HEAD"),
            Method::Get => f.write_str("GET"),
        }
    }
}

/// Outcome of a single request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    /// HTTP status, or 0 when no response arrived
    pub status: u16,
    /// URL after following redirects
    pub final_url: String,
    /// True when `final_url` differs from the requested URL
    pub redirected: bool,
    /// Decoded body (GET only, empty otherwise)
    pub body: String,
    /// What went wrong, if anything
    pub error: Option<String>,
}

impl FetchResult {
    /// A response arrived with a success or redirect status
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    fn failed(url: &str, status: u16, error: String) -> Self {
        FetchResult {
            status,
            final_url: url.to_string(),
            redirected: false,
            body: String::new(),
            error: Some(error),
        }
    }
}

/// Anything that can fetch a URL. The passes only talk to this trait.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, method: Method) -> FetchResult;
}

/// Settings for the real HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: Duration::from_secs(15),
            user_agent: format!("citation-guardian/{} (verification)", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// reqwest-backed fetcher that goes through the per-domain rate limiter
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        // One client for all requests (connection pooling)
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(HttpFetcher { client, limiter })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, method: Method) -> FetchResult {
        self.limiter.acquire(&domain_key(url)).await;
        info!(%method, url, "Fetching");

        let request = match method {
            Method::Head => self.client.head(url),
            Method::Get => self.client.get(url),
        };

        match request.send().await {
            Ok(response) => analyze_response(url, method, response).await,
            Err(e) => FetchResult::failed(url, 0, categorize_error(&e)),
        }
    }
}

/// Rate limiting key: `host[:port]`, like the authority part of the URL.
///
/// Unparseable URLs share the empty key; the request itself will fail.
pub fn domain_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => String::new(),
        },
        Err(_) => String::new(),
    }
}

// Turns a response into a FetchResult.
//
// HTTP status codes:
// - 200-399: Success (redirects were already followed by the client)
// - 400-599: Error; recorded with the status code, not raised
async fn analyze_response(url: &str, method: Method, response: reqwest::Response) -> FetchResult {
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        return FetchResult::failed(
            url,
            status.as_u16(),
            format!("HTTP Error {}: {}", status.as_u16(), reason),
        );
    }

    let final_url = response.url().to_string();
    let redirected = is_redirect(url, response.url());

    let body = match method {
        Method::Head => String::new(),
        Method::Get => match response.text().await {
            Ok(text) => text,
            Err(e) => return FetchResult::failed(url, 0, categorize_error(&e)),
        },
    };

    FetchResult {
        status: status.as_u16(),
        final_url,
        redirected,
        body,
        error: None,
    }
}

// Compares parsed URLs so `https://x.com` vs `https://x.com/` is not a redirect
fn is_redirect(requested: &str, landed: &Url) -> bool {
    match Url::parse(requested) {
        Ok(requested) => &requested != landed,
        Err(_) => requested != landed.as_str(),
    }
}

// Categorizes reqwest errors into short human-readable messages
fn categorize_error(error: &reqwest::Error) -> String {
    // Walk the whole source chain; the interesting part is often nested
    let mut detail = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        detail.push_str(": ");
        detail.push_str(&inner.to_string());
        source = inner.source();
    }
    let lowered = detail.to_lowercase();

    if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
        "SSL certificate error".to_string()
    } else if error.is_connect() {
        if lowered.contains("dns") || lowered.contains("resolve") || lowered.contains("lookup") {
            "Could not resolve hostname".to_string()
        } else {
            "Connection failed".to_string()
        }
    } else {
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::rate_limit::SystemClock;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // A tiny HTTP/1.1 server with three routes:
    //   /old  -> 301 to /new
    //   /new  -> 200 with an HTML body
    //   else  -> 404
    async fn spawn_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&buf).to_string();
                    let mut parts = request.split_whitespace();
                    let method = parts.next().unwrap_or("");
                    let path = parts.next().unwrap_or("");

                    let body = "<html><body><h2 id=\"setup\">Setup</h2></body></html>";
                    let (status, extra, body) = match path {
                        "/old" => ("301 Moved Permanently", "Location: /new\r\n", ""),
                        "/new" => ("200 OK", "Content-Type: text/html\r\n", body),
                        _ => ("404 Not Found", "", ""),
                    };
                    let payload = if method == "HEAD" { "" } else { body };
                    let response = format!(
                        "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        extra,
                        body.len(),
                        payload
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    fn fetcher() -> HttpFetcher {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(1), Arc::new(SystemClock)));
        let config = FetchConfig {
            timeout: Duration::from_secs(5),
            ..FetchConfig::default()
        };
        HttpFetcher::new(&config, limiter).unwrap()
    }

    #[tokio::test]
    async fn test_head_follows_redirect() {
        let base = spawn_server().await;
        let result = fetcher().fetch(&format!("{}/old", base), Method::Head).await;

        assert_eq!(result.status, 200);
        assert!(result.redirected);
        assert_eq!(result.final_url, format!("{}/new", base));
        assert!(result.body.is_empty());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_get_captures_body() {
        let base = spawn_server().await;
        let result = fetcher().fetch(&format!("{}/new", base), Method::Get).await;

        assert_eq!(result.status, 200);
        assert!(!result.redirected);
        assert!(result.body.contains("id=\"setup\""));
    }

    #[tokio::test]
    async fn test_http_error_is_reported_not_raised() {
        let base = spawn_server().await;
        let url = format!("{}/missing", base);
        let result = fetcher().fetch(&url, Method::Head).await;

        assert_eq!(result.status, 404);
        assert!(!result.is_success());
        assert_eq!(result.final_url, url);
        assert_eq!(result.error.as_deref(), Some("HTTP Error 404: Not Found"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_status_zero() {
        // Bind then drop to get a port nobody is listening on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = fetcher().fetch(&format!("http://{}/", addr), Method::Head).await;
        assert_eq!(result.status, 0);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_domain_key() {
        assert_eq!(domain_key("https://docs.example.com/a/b#c"), "docs.example.com");
        assert_eq!(domain_key("http://127.0.0.1:8080/x"), "127.0.0.1:8080");
        assert_eq!(domain_key("not a url"), "");
    }

    #[test]
    fn test_trailing_slash_is_not_a_redirect() {
        let landed = Url::parse("https://example.com/").unwrap();
        assert!(!is_redirect("https://example.com", &landed));
        let moved = Url::parse("https://new.example.com/").unwrap();
        assert!(is_redirect("https://example.com", &moved));
    }
}
