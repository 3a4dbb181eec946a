// src/crawl/mod.rs
// =============================================================================
// This module is the crawl engine.
//
// Features:
// - Breadth-first crawling from one start URL with a depth limit
// - A fixed pool of workers sharing one frontier
// - Termination once no work is left anywhere (not merely an empty queue)
// - Each canonical URL is enqueued at most once
//
// Submodules:
// - canonical: URL normalization and relative link resolution
// - frontier: the shared FIFO work queue and termination detector
// - visited: the set of URLs already accepted for crawling
// - pool: the workers and the run driver
// =============================================================================

mod canonical;
mod frontier;
mod pool;
mod visited;

pub use canonical::{CanonicalError, CanonicalUrl};
pub use pool::{CrawlReport, Crawler};
