// src/fetch/mod.rs
// =============================================================================
// The page-fetching boundary of the crawler.
//
// The crawl engine only knows the Fetcher trait: give it a URL, get the body
// bytes back or a typed failure. The production implementation (http.rs) uses
// reqwest; tests plug in an in-memory site instead.
//
// Submodules:
// - http: HttpFetcher, the reqwest-backed implementation
// =============================================================================

mod http;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use http::HttpFetcher;

/// Per-request settings passed along with every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Upper bound for the whole request, so a hung server cannot block
    /// pool shutdown.
    pub timeout: Duration,
    pub follow_redirects: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            follow_redirects: true,
        }
    }
}

/// Why a page could not be fetched.
///
/// Every variant is a per-page failure: it is logged and the crawl goes on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("could not resolve hostname")]
    Dns,
    #[error("TLS certificate error")]
    Tls,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<Vec<u8>, FetchError>;
}
