// src/crawl/frontier.rs
// =============================================================================
// The shared work queue of the crawl, plus the termination detector.
//
// How termination works:
// - `outstanding` counts items that are queued OR being processed by a worker
// - push() increments it, the end of processing (Lease drop) decrements it
// - When it drops to zero there is no work anywhere: nobody is mid-fetch and
//   about to push more. Only then do waiting workers get the stop signal.
//
// An empty queue alone means nothing: another worker may still be fetching a
// page that links to fifty more.
//
// Rust concepts:
// - Mutex: the queue and counters live behind one lock, never held across .await
// - Notify: async wake-ups for workers waiting on an empty queue
// - RAII: a Lease marks its item done when dropped, on every exit path
// =============================================================================

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::canonical::CanonicalUrl;

/// One unit of crawl work: a page and how many hops it is from the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: CanonicalUrl,
    pub depth: u32,
}

impl WorkItem {
    pub fn seed(url: CanonicalUrl) -> Self {
        Self { url, depth: 0 }
    }

    /// A link discovered on this page, one level deeper.
    pub fn child(&self, url: CanonicalUrl) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}

/// Counters exposed for reporting and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    pub pushed: usize,
    pub completed: usize,
    pub outstanding: usize,
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<WorkItem>,
    outstanding: usize,
    pushed: usize,
    completed: usize,
    closed: bool,
}

impl State {
    fn is_quiescent(&self) -> bool {
        self.outstanding == 0
    }
}

pub struct Frontier {
    state: Mutex<State>,
    // Woken once per push; woken all at once on quiescence or close
    available: Notify,
    // Driver-side wait for quiescence
    drained: Notify,
    cancel: CancellationToken,
}

impl Frontier {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            state: Mutex::new(State::default()),
            available: Notify::new(),
            drained: Notify::new(),
            cancel,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // No code path panics while holding the lock, but if one ever did
        // the counters are still consistent, so recover the guard.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends an item and wakes one waiting worker.
    ///
    /// Returns false if the frontier no longer accepts work (closed or
    /// cancelled); the item is then not counted as outstanding.
    pub fn push(&self, item: WorkItem) -> bool {
        {
            let mut state = self.lock();
            if state.closed || self.cancel.is_cancelled() {
                return false;
            }
            trace!(url = %item.url, depth = item.depth, "enqueue");
            state.queue.push_back(item);
            state.outstanding += 1;
            state.pushed += 1;
        }
        self.available.notify_one();
        true
    }

    /// Claims the next item, waiting while the queue is empty but work is
    /// still in flight.
    ///
    /// Returns `None` (the stop signal) once the crawl is quiescent, the
    /// frontier was closed, or the run was cancelled.
    pub async fn pop(&self) -> Option<Lease<'_>> {
        loop {
            // Register interest before looking at the state so a push or
            // quiescence broadcast between the check and the await is not lost.
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if state.closed || self.cancel.is_cancelled() {
                    return None;
                }
                if let Some(item) = state.queue.pop_front() {
                    return Some(Lease {
                        frontier: self,
                        item,
                    });
                }
                if state.is_quiescent() {
                    return None;
                }
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = self.cancel.cancelled() => return None,
            }
        }
    }

    /// Completes one claimed item. Called exactly once per item by `Lease`.
    fn mark_done(&self) {
        let quiescent = {
            let mut state = self.lock();
            debug_assert!(state.outstanding > 0, "mark_done without outstanding work");
            state.outstanding = state.outstanding.saturating_sub(1);
            state.completed += 1;
            state.is_quiescent()
        };

        if quiescent {
            trace!("frontier quiescent");
            self.available.notify_waiters();
            self.drained.notify_waiters();
        }
    }

    /// Resolves once no work is left anywhere, or the run is cancelled.
    pub async fn quiescent(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.lock().is_quiescent() {
                return;
            }

            tokio::select! {
                _ = &mut notified => {}
                _ = self.cancel.cancelled() => return,
            }
        }
    }

    /// Stops handing out work. Every later `pop()` returns `None`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
        self.drained.notify_waiters();
    }

    pub fn stats(&self) -> FrontierStats {
        let state = self.lock();
        FrontierStats {
            pushed: state.pushed,
            completed: state.completed,
            outstanding: state.outstanding,
        }
    }
}

/// A claimed work item. Dropping it marks the item done.
pub struct Lease<'a> {
    frontier: &'a Frontier,
    item: WorkItem,
}

impl Lease<'_> {
    pub fn item(&self) -> &WorkItem {
        &self.item
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.frontier.mark_done();
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why enable() before checking the queue?
//    - A Notified future only sees notify_waiters() calls made after it is
//      registered. enable() registers it without awaiting.
//    - Without it, quiescence could be broadcast between our check and our
//      .await and we would sleep forever.
//
// 2. Why two Notify instances?
//    - notify_one() hands its wake-up to a single waiter. If the driver were
//      waiting on the same Notify it could swallow the wake-up meant for a
//      worker, leaving an item queued with every worker asleep.
//
// 3. Why is mark_done private?
//    - The only way to complete an item is to drop its Lease, so an item can
//      never be completed twice or forgotten.
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn item(path: &str, depth: u32) -> WorkItem {
        WorkItem {
            url: CanonicalUrl::parse(&format!("https://a.test{path}")).unwrap(),
            depth,
        }
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let frontier = Frontier::new(CancellationToken::new());
        frontier.push(item("/1", 0));
        frontier.push(item("/2", 1));
        frontier.push(item("/3", 1));

        let first = frontier.pop().await.unwrap();
        assert_eq!(first.item().url.as_str(), "https://a.test/1");
        let second = frontier.pop().await.unwrap();
        assert_eq!(second.item().url.as_str(), "https://a.test/2");
        let third = frontier.pop().await.unwrap();
        assert_eq!(third.item().depth, 1);
    }

    #[tokio::test]
    async fn test_stop_after_last_item_done() {
        let frontier = Frontier::new(CancellationToken::new());
        frontier.push(item("/", 0));

        let lease = frontier.pop().await.unwrap();
        assert_eq!(frontier.stats().outstanding, 1);
        drop(lease);

        assert!(frontier.pop().await.is_none());
        let stats = frontier.stats();
        assert_eq!(stats.pushed, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.outstanding, 0);
    }

    #[tokio::test]
    async fn test_empty_queue_is_not_quiescence() {
        let frontier = Arc::new(Frontier::new(CancellationToken::new()));
        frontier.push(item("/", 0));
        let lease = frontier.pop().await.unwrap();

        // Queue is empty but the lease is still in flight: a second worker
        // must keep waiting instead of exiting.
        let waiter = {
            let frontier = frontier.clone();
            tokio::spawn(async move {
                frontier
                    .pop()
                    .await
                    .map(|lease| lease.item().url.to_string())
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        // The in-flight item discovers a new link before completing
        frontier.push(lease.item().child(CanonicalUrl::parse("https://a.test/b").unwrap()));
        drop(lease);

        let got = waiter.await.unwrap();
        assert_eq!(got.as_deref(), Some("https://a.test/b"));
        assert!(frontier.pop().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_quiescence_wakes_all_waiters() {
        let frontier = Arc::new(Frontier::new(CancellationToken::new()));
        frontier.push(item("/", 0));
        let lease = frontier.pop().await.unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let frontier = frontier.clone();
                tokio::spawn(async move { frontier.pop().await.is_none() })
            })
            .collect();
        let driver = {
            let frontier = frontier.clone();
            tokio::spawn(async move { frontier.quiescent().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(lease);

        for waiter in waiters {
            assert!(waiter.await.unwrap());
        }
        driver.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_stops_pop_immediately() {
        let cancel = CancellationToken::new();
        let frontier = Frontier::new(cancel.clone());
        frontier.push(item("/", 0));
        frontier.push(item("/x", 1));

        cancel.cancel();
        assert!(frontier.pop().await.is_none());
        assert!(!frontier.push(item("/y", 1)));
        // quiescent() returns on cancellation even though work is outstanding
        frontier.quiescent().await;
        assert_eq!(frontier.stats().outstanding, 2);
    }

    #[tokio::test]
    async fn test_close_rejects_pop_and_push() {
        let frontier = Frontier::new(CancellationToken::new());
        frontier.push(item("/", 0));
        frontier.close();
        assert!(frontier.pop().await.is_none());
        assert!(!frontier.push(item("/b", 1)));
        assert_eq!(frontier.stats().pushed, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_done_count_matches_push_count() {
        // Each item at depth < 3 fans out into three children
        let frontier = Arc::new(Frontier::new(CancellationToken::new()));
        frontier.push(item("/", 0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let frontier = frontier.clone();
                tokio::spawn(async move {
                    while let Some(lease) = frontier.pop().await {
                        let current = lease.item().clone();
                        if current.depth < 3 {
                            for n in 0..3 {
                                let url = current.url.join(&format!("{n}/")).unwrap();
                                frontier.push(current.child(url));
                            }
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        futures::future::join_all(workers).await;
        let stats = frontier.stats();
        assert_eq!(stats.pushed, 1 + 3 + 9 + 27);
        assert_eq!(stats.completed, stats.pushed);
        assert_eq!(stats.outstanding, 0);
    }
}
