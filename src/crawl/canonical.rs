// src/crawl/canonical.rs
// =============================================================================
// Turns raw href strings into canonical absolute URLs.
//
// Two links that canonicalize to the same string are the same page as far as
// the crawler is concerned. The rules:
// - Relative references are resolved against the page they were found on
// - Fragments (#section) are stripped
// - Scheme and host are lowercased, default ports dropped (done by `url`)
// - Only http/https URLs with a host are crawlable
//
// Rust concepts:
// - Newtype pattern: CanonicalUrl wraps Url so only normalized URLs get in
// - thiserror: derive Display/Error for our error enum
// =============================================================================

use std::fmt;

use thiserror::Error;
use url::Url;

/// Why a raw link could not be turned into a crawlable URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("empty link")]
    Empty,
    #[error("malformed URL '{href}': {source}")]
    Malformed {
        href: String,
        source: url::ParseError,
    },
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("URL has no host: {0}")]
    NoHost(String),
}

/// A normalized absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Parses an absolute URL (the seed) into canonical form.
    pub fn parse(input: &str) -> Result<Self, CanonicalError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CanonicalError::Empty);
        }
        let url = Url::parse(trimmed).map_err(|source| CanonicalError::Malformed {
            href: trimmed.to_string(),
            source,
        })?;
        Self::from_url(url)
    }

    /// Resolves `href` as found on the page at `self`.
    pub fn join(&self, href: &str) -> Result<Self, CanonicalError> {
        canonicalize(&self.0, href)
    }

    fn from_url(mut url: Url) -> Result<Self, CanonicalError> {
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(CanonicalError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(CanonicalError::NoHost(url.to_string()));
        }
        url.set_fragment(None);
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Resolves a (possibly relative) link against `base` and normalizes it.
///
/// `Url::join` already handles absolute hrefs, scheme-relative `//host/x`
/// references and dot segments, and the WHATWG parser lowercases the scheme
/// and host and drops default ports.
pub fn canonicalize(base: &Url, href: &str) -> Result<CanonicalUrl, CanonicalError> {
    let href = href.trim();
    if href.is_empty() {
        return Err(CanonicalError::Empty);
    }

    let joined = base.join(href).map_err(|source| CanonicalError::Malformed {
        href: href.to_string(),
        source,
    })?;

    CanonicalUrl::from_url(joined)
}
