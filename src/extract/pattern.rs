// src/extract/pattern.rs
// =============================================================================
// Extracts links with a pattern scan over the raw bytes.
//
// No DOM is built: the regex walks the body and each match is decoded only
// when the caller asks for the next link. Tags that never close, comments and
// other garbage simply don't match.
//
// Accepted forms (tag and attribute names case-insensitive):
//   <a href="x">   <a href='x'>   <a href=x>   <area ... href="x">
// =============================================================================

use regex::bytes::{CaptureMatches, Regex};

use super::{clean_href, LinkExtractor, Links};

// (?i-u): case-insensitive, byte-oriented so invalid UTF-8 cannot break a match
const ANCHOR_PATTERN: &str =
    r#"(?i-u)<(?:a|area)\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#;

#[derive(Debug, Clone)]
pub struct PatternExtractor {
    anchor: Regex,
}

impl PatternExtractor {
    pub fn new() -> Self {
        Self {
            // Constant pattern covered by tests, so failure is a programmer error
            anchor: Regex::new(ANCHOR_PATTERN).expect("anchor pattern is valid"),
        }
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkExtractor for PatternExtractor {
    fn extract<'a>(&'a self, body: &'a [u8]) -> Links<'a> {
        Links::scanned(Scan {
            captures: self.anchor.captures_iter(body),
        })
    }
}

pub(super) struct Scan<'a> {
    captures: CaptureMatches<'a, 'a>,
}

impl Iterator for Scan<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let caps = self.captures.next()?;
        let value = (1..=3).find_map(|group| caps.get(group))?;
        let decoded = String::from_utf8_lossy(value.as_bytes()).replace("&amp;", "&");
        Some(clean_href(&decoded))
    }
}
