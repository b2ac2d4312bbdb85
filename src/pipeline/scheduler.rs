//! Scheduler for admission-controlled fetching
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Pulling requests from the bounded request queue
//! - Spawning one tracked task per admitted request
//! - Closing the result queue only after every task has finished
//! - Cooperative cancellation of the loop and of in-flight fetches

use crate::pipeline::{Fetch, FetchOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use url::Url;

/// What the scheduler did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Requests taken from the queue and handed to a fetch task
    pub admitted: u64,

    /// Whether the loop stopped because of cancellation
    pub cancelled: bool,
}

/// Scheduler runs at most `max_parallel` fetches at a time
///
/// Each admitted request holds one semaphore permit for the lifetime of its
/// task, including the write of its result, so the number of running tasks
/// never exceeds the number of permits.
pub struct Scheduler<F: Fetch> {
    /// Shared fetch implementation
    fetcher: Arc<F>,

    /// Global semaphore for limiting concurrent fetches
    slots: Arc<Semaphore>,

    max_parallel: usize,

    /// Recheck interval while every slot is taken
    admission_backoff: Duration,

    cancel: CancellationToken,

    /// Tracks spawned fetch tasks so the result queue outlives every writer
    tasks: TaskTracker,
}

impl<F: Fetch> Scheduler<F> {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The fetch implementation shared by all tasks
    /// * `max_parallel` - Maximum number of concurrent fetches (at least 1)
    /// * `admission_backoff` - Recheck interval while at capacity
    /// * `cancel` - Token that stops the loop and aborts in-flight fetches
    pub fn new(
        fetcher: Arc<F>,
        max_parallel: usize,
        admission_backoff: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let max_parallel = max_parallel.max(1);

        Self {
            fetcher,
            slots: Arc::new(Semaphore::new(max_parallel)),
            max_parallel,
            admission_backoff,
            cancel,
            tasks: TaskTracker::new(),
        }
    }

    /// Returns the semaphore guarding fetch slots
    pub fn slots(&self) -> Arc<Semaphore> {
        Arc::clone(&self.slots)
    }

    /// Returns the tracker holding every spawned fetch task
    pub fn tasks(&self) -> TaskTracker {
        self.tasks.clone()
    }

    /// Number of fetch tasks that have not finished yet
    ///
    /// The permit the loop holds while waiting for the next request is not
    /// counted.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Runs the admission loop until the request queue closes or the token fires
    ///
    /// 1. Waits for a free slot
    /// 2. Waits for the next request (or cancellation)
    /// 3. Spawns a tracked task that fetches, writes the outcome, then frees the slot
    ///
    /// On exit the loop waits for every spawned task before dropping `results`,
    /// so no write is ever attempted on a finished result queue.
    pub async fn run(
        self,
        mut requests: mpsc::Receiver<Url>,
        results: mpsc::Sender<FetchOutcome>,
    ) -> SchedulerReport {
        let mut report = SchedulerReport::default();

        loop {
            let Some(permit) = self.admit().await else {
                report.cancelled = true;
                break;
            };

            let url = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                next = requests.recv() => match next {
                    Some(url) => url,
                    None => break,
                },
            };

            report.admitted += 1;
            tracing::debug!("Admitting {}", url);
            self.spawn_fetch(url, permit, results.clone());
            tracing::debug!(
                "{}/{} fetches running",
                self.in_flight(),
                self.max_parallel
            );
        }

        // Stop intake so producers see a closed queue instead of blocking
        requests.close();

        self.tasks.close();
        tracing::debug!("Waiting for {} fetch tasks to finish", self.tasks.len());
        self.tasks.wait().await;
        drop(results);

        tracing::debug!(
            "Scheduler stopped after admitting {} requests (cancelled: {})",
            report.admitted,
            report.cancelled
        );
        report
    }

    /// Waits for a free fetch slot, rechecking every backoff interval
    ///
    /// Returns `None` if cancelled first.
    async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        loop {
            let acquire = tokio::time::timeout(
                self.admission_backoff,
                Arc::clone(&self.slots).acquire_owned(),
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                acquired = acquire => match acquired {
                    Ok(Ok(permit)) => return Some(permit),
                    // The semaphore is never closed while the scheduler owns it
                    Ok(Err(_)) => return None,
                    Err(_) => tracing::trace!(
                        "All {} fetch slots busy, rechecking in {:?}",
                        self.max_parallel,
                        self.admission_backoff
                    ),
                },
            }
        }
    }

    fn spawn_fetch(
        &self,
        url: Url,
        permit: OwnedSemaphorePermit,
        results: mpsc::Sender<FetchOutcome>,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let cancel = self.cancel.clone();

        self.tasks.spawn(async move {
            let _permit = permit;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Fetch of {} aborted by cancellation", url);
                    return;
                }
                outcome = fetcher.fetch(&url) => outcome,
            };

            match &outcome.error {
                Some(error) => tracing::warn!("Fetch of {} failed: {}", outcome.url, error),
                None => tracing::debug!("Fetched {}: {} matches", outcome.url, outcome.count),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Result for {} discarded after cancellation", url);
                }
                sent = results.send(outcome) => {
                    if sent.is_err() {
                        tracing::debug!("Result queue closed, discarding result for {}", url);
                    }
                }
            }
        });
    }
}
