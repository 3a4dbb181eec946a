// src/crawl/visited.rs
// =============================================================================
// Remembers every URL the crawl has accepted for enqueueing.
//
// A URL is claimed when it is first discovered, not when it is processed.
// That way two workers that find the same link at the same time cannot both
// enqueue it: exactly one try_claim() wins.
// =============================================================================

use std::collections::HashSet;
use std::sync::Mutex;

use super::canonical::CanonicalUrl;

#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `url` if absent. Returns true iff this call inserted it.
    pub fn try_claim(&self, url: &CanonicalUrl) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.as_str().to_owned())
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
