// src/extract/mod.rs
// =============================================================================
// Pulls outbound links out of fetched pages.
//
// Two strategies, same contract:
// - html: builds a DOM with scraper and selects anchor-like elements
// - pattern: scans the raw bytes with a tolerant regex, no DOM at all
//
// Both hand back a lazy iterator of raw href strings in document order.
// Nothing here validates URLs; the crawl loop canonicalizes and drops junk.
// Broken markup never fails a document, it just yields fewer links.
// =============================================================================

mod html;
mod pattern;

use clap::ValueEnum;

pub use html::DomExtractor;
pub use pattern::PatternExtractor;

/// Lazy, finite sequence of href values found in one document.
///
/// Calling the extractor again on the same body starts a fresh sequence.
pub struct Links<'a> {
    inner: LinksInner<'a>,
}

enum LinksInner<'a> {
    Parsed(std::vec::IntoIter<String>),
    Scanned(pattern::Scan<'a>),
}

impl<'a> Links<'a> {
    fn parsed(hrefs: Vec<String>) -> Self {
        Self {
            inner: LinksInner::Parsed(hrefs.into_iter()),
        }
    }

    fn scanned(scan: pattern::Scan<'a>) -> Self {
        Self {
            inner: LinksInner::Scanned(scan),
        }
    }
}

impl Iterator for Links<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match &mut self.inner {
            LinksInner::Parsed(hrefs) => hrefs.next(),
            LinksInner::Scanned(scan) => scan.next(),
        }
    }
}

pub trait LinkExtractor: Send + Sync {
    fn extract<'a>(&'a self, body: &'a [u8]) -> Links<'a>;
}

/// Which extraction strategy to use (selectable on the command line).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExtractorKind {
    /// Parse the page into a DOM and select <a>/<area> elements
    #[default]
    Dom,
    /// Scan the raw markup with a tolerant pattern
    Pattern,
}

impl ExtractorKind {
    pub fn build(self) -> Box<dyn LinkExtractor> {
        match self {
            ExtractorKind::Dom => Box::new(DomExtractor::new()),
            ExtractorKind::Pattern => Box::new(PatternExtractor::new()),
        }
    }
}

// Shared cleanup for raw attribute values
fn clean_href(raw: &str) -> String {
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both strategies must agree on well-formed input
    #[test]
    fn test_strategies_agree_on_clean_markup() {
        let html = br#"
            <html><body>
              <a href="/one">1</a>
              <p>text <a class="x" href='two'>2</a></p>
              <map><area href="/three" alt="3"></map>
              <a name="no-href">skip</a>
            </body></html>
        "#;

        for kind in [ExtractorKind::Dom, ExtractorKind::Pattern] {
            let extractor = kind.build();
            let links: Vec<String> = extractor.extract(html).collect();
            assert_eq!(links, vec!["/one", "two", "/three"], "{kind:?}");
        }
    }

    #[test]
    fn test_sequence_restarts() {
        let extractor = ExtractorKind::Pattern.build();
        let html = b"<a href=\"/a\"></a><a href=\"/b\"></a>";

        let mut first = extractor.extract(html);
        assert_eq!(first.next().as_deref(), Some("/a"));
        let again: Vec<String> = extractor.extract(html).collect();
        assert_eq!(again, vec!["/a", "/b"]);
    }
}
