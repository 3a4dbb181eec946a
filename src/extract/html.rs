// src/extract/html.rs
// =============================================================================
// Extracts links by parsing the page into a DOM.
//
// We use the `scraper` crate which:
// - Parses HTML into a tree with html5ever, recovering from broken markup the
//   way browsers do (unclosed tags, stray attributes, garbage in between)
// - Supports CSS selectors for finding elements
// - Decodes entities in attribute values (&amp; -> &)
// =============================================================================

use scraper::{Html, Selector};
use tracing::warn;

use super::{clean_href, LinkExtractor, Links};

// Anchor-like elements that carry a navigable href
const ANCHOR_SELECTOR: &str = "a[href], area[href]";

#[derive(Debug, Clone, Copy, Default)]
pub struct DomExtractor;

impl DomExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LinkExtractor for DomExtractor {
    fn extract<'a>(&'a self, body: &'a [u8]) -> Links<'a> {
        // Selected elements borrow the document, which only lives for this
        // call, so the hrefs are copied out before it is dropped.
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let selector = match Selector::parse(ANCHOR_SELECTOR) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("invalid anchor selector: {:?}", e);
                return Links::parsed(Vec::new());
            }
        };

        let hrefs = document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .map(clean_href)
            .collect();

        Links::parsed(hrefs)
    }
}
