// src/crawl/pool.rs
// =============================================================================
// The worker pool: N tasks draining the frontier until no work is left.
//
// Each worker loops:
// 1. Claim an item from the frontier (or get the stop signal and exit)
// 2. Items at the depth limit are recorded as leaves, never fetched
// 3. Fetch the page; failures go to the error log and the item is done
// 4. Extract links, canonicalize them, claim unseen ones, enqueue at depth+1
// 5. Record the page as visited
// 6. Drop the lease, which marks the item done
//
// The driver (Crawler::run) seeds the frontier, spawns the workers, waits for
// quiescence (or cancellation, or a worker dying), closes the frontier and
// joins everyone.
//
// Lifecycle: Seeded -> Running -> Quiescent -> Stopped
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

use super::frontier::{Frontier, WorkItem};
use super::visited::VisitedSet;
use crate::config::CrawlConfig;
use crate::extract::LinkExtractor;
use crate::fetch::Fetcher;
use crate::record::Recorder;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("worker pool needs at least one worker")]
    NoWorkers,
    #[error("worker task failed: {0}")]
    Worker(#[from] JoinError),
}

/// Where the pool is in its lifecycle. States are only ever entered in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    /// Frontier holds exactly the start item
    Seeded,
    /// Workers are draining the frontier
    Running,
    /// No work left anywhere (or the run was cancelled)
    Quiescent,
    /// All workers have exited and been joined
    Stopped,
}

impl PoolState {
    fn advance(self) -> Self {
        let next = match self {
            PoolState::Seeded => PoolState::Running,
            PoolState::Running => PoolState::Quiescent,
            PoolState::Quiescent | PoolState::Stopped => PoolState::Stopped,
        };
        info!(from = ?self, to = ?next, "pool state");
        next
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub start_url: String,
    pub max_depth: u32,
    pub workers: usize,
    /// URLs written to the output (fetched pages and depth-limit leaves)
    pub visited: usize,
    pub fetched: usize,
    pub failed: usize,
    /// Items recorded at the depth limit without fetching
    pub leaves: usize,
    /// Distinct canonical URLs claimed, seed included
    pub discovered: usize,
    /// Items pushed onto the frontier, seed included
    pub enqueued: usize,
    /// Items marked done
    pub completed: usize,
    pub cancelled: bool,
    pub state: PoolState,
    pub elapsed_ms: u64,
}

#[derive(Debug, Default)]
struct Counters {
    visited: AtomicUsize,
    fetched: AtomicUsize,
    failed: AtomicUsize,
    leaves: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Everything the workers share for one run.
struct Shared {
    config: CrawlConfig,
    frontier: Frontier,
    visited: VisitedSet,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    recorder: Arc<dyn Recorder>,
    cancel: CancellationToken,
    counters: Counters,
}

pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    recorder: Arc<dyn Recorder>,
}

impl Crawler {
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        recorder: Arc<dyn Recorder>,
    ) -> Self {
        Self {
            config,
            fetcher,
            extractor,
            recorder,
        }
    }

    /// Runs the crawl to completion.
    ///
    /// Cancelling `cancel` (or hitting the configured run timeout) stops the
    /// pool early: workers stop claiming items and abandon in-flight fetches.
    pub async fn run(self, cancel: CancellationToken) -> Result<CrawlReport, CrawlError> {
        let workers = self.config.workers;
        if workers == 0 {
            return Err(CrawlError::NoWorkers);
        }
        let started = Instant::now();

        let shared = Arc::new(Shared {
            frontier: Frontier::new(cancel.clone()),
            visited: VisitedSet::new(),
            fetcher: self.fetcher,
            extractor: self.extractor,
            recorder: self.recorder,
            cancel: cancel.clone(),
            counters: Counters::default(),
            config: self.config,
        });

        let seed = WorkItem::seed(shared.config.start_url.clone());
        shared.visited.try_claim(&seed.url);
        shared.frontier.push(seed);
        let mut state = PoolState::Seeded;
        info!(
            url = %shared.config.start_url,
            max_depth = shared.config.max_depth,
            workers,
            "crawl seeded"
        );

        let mut pool = JoinSet::new();
        for id in 0..workers {
            pool.spawn(run_worker(shared.clone()).instrument(info_span!("worker", id)));
        }
        state = state.advance();

        // A dead worker leaves its share of the queue undrained, so it ends
        // the run instead of waiting on a quiescence that never comes.
        let mut failure = None;
        let deadline = run_deadline(shared.config.run_timeout);
        tokio::select! {
            _ = shared.frontier.quiescent() => {}
            _ = deadline => {
                warn!("run timeout reached, cancelling crawl");
                cancel.cancel();
            }
            e = first_failure(&mut pool) => {
                error!("worker failed, cancelling crawl: {}", e);
                cancel.cancel();
                failure = Some(e);
            }
        }
        state = state.advance();

        shared.frontier.close();
        while let Some(result) = pool.join_next().await {
            if let Err(e) = result {
                error!("worker failed: {}", e);
                failure.get_or_insert(e);
            }
        }
        state = state.advance();

        if let Some(e) = failure {
            return Err(CrawlError::Worker(e));
        }

        let frontier = shared.frontier.stats();
        let counters = &shared.counters;
        let report = CrawlReport {
            start_url: shared.config.start_url.to_string(),
            max_depth: shared.config.max_depth,
            workers,
            visited: counters.visited.load(Ordering::Relaxed),
            fetched: counters.fetched.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            leaves: counters.leaves.load(Ordering::Relaxed),
            discovered: shared.visited.len(),
            enqueued: frontier.pushed,
            completed: frontier.completed,
            cancelled: cancel.is_cancelled(),
            state,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            visited = report.visited,
            failed = report.failed,
            cancelled = report.cancelled,
            unfinished = frontier.outstanding,
            "crawl finished"
        );
        Ok(report)
    }
}

async fn run_deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

// Resolves with the first worker that panicked or was aborted. Workers that
// exit normally are skipped.
async fn first_failure(pool: &mut JoinSet<()>) -> JoinError {
    loop {
        match pool.join_next().await {
            Some(Err(e)) => return e,
            Some(Ok(())) => continue,
            None => std::future::pending().await,
        }
    }
}

async fn run_worker(shared: Arc<Shared>) {
    debug!("worker started");
    while let Some(lease) = shared.frontier.pop().await {
        shared.process(lease.item()).await;
        // lease dropped here: item done
    }
    debug!("worker stopped");
}

impl Shared {
    async fn process(&self, item: &WorkItem) {
        if item.depth >= self.config.max_depth {
            trace!(url = %item.url, depth = item.depth, "depth limit, recording leaf");
            Counters::bump(&self.counters.leaves);
            self.record(item);
            return;
        }

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(url = %item.url, "abandoning fetch");
                return;
            }
            result = self.fetcher.fetch(item.url.as_url(), &self.config.fetch) => result,
        };

        let body = match fetched {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %item.url, error = %e, "fetch failed");
                Counters::bump(&self.counters.failed);
                self.recorder
                    .record_error(&format!("failed to fetch {}: {}", item.url, e), Utc::now());
                return;
            }
        };
        Counters::bump(&self.counters.fetched);

        let enqueued = self.expand(item, &body);
        debug!(url = %item.url, depth = item.depth, enqueued, "page processed");
        self.record(item);
    }

    // Extract, canonicalize, dedup and enqueue. No .await in here.
    fn expand(&self, item: &WorkItem, body: &[u8]) -> usize {
        let mut enqueued = 0;

        for href in self.extractor.extract(body) {
            let url = match item.url.join(&href) {
                Ok(url) => url,
                Err(e) => {
                    trace!(href = %href, error = %e, "discarding link");
                    continue;
                }
            };

            if self.config.same_host_only && url.host() != self.config.start_url.host() {
                continue;
            }

            let child = item.child(url);
            if child.depth > self.config.max_depth {
                continue;
            }
            if self.visited.try_claim(&child.url) && self.frontier.push(child) {
                enqueued += 1;
            }
        }

        enqueued
    }

    fn record(&self, item: &WorkItem) {
        match self.recorder.record_visited(item.url.as_str()) {
            Ok(()) => Counters::bump(&self.counters.visited),
            Err(e) => {
                error!(url = %item.url, error = %e, "could not record visited URL");
                self.recorder
                    .record_error(&format!("failed to record {}: {}", item.url, e), Utc::now());
            }
        }
    }
}
