//! Fetch pipeline: admission-controlled word counting
//!
//! This module wires together the three stages of a run:
//! - The [`Scheduler`] pulls URLs from a bounded request queue and runs at most
//!   `max-parallel` fetches at once
//! - The [`Fetch`] implementation performs one GET and counts the target word
//! - The [`ResultSink`] drains outcomes into a [`ResultReporter`]
//!
//! A single [`CancellationToken`] stops both loops and every in-flight fetch.

mod fetcher;
mod scheduler;
mod sink;

pub use fetcher::{build_http_client, count_occurrences, Fetch, WordCountClient};
pub use scheduler::{Scheduler, SchedulerReport};
pub use sink::ResultSink;

use crate::config::SchedulerConfig;
use crate::output::{ResultReporter, TallyStatistics};
use crate::{FetchError, TallyError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use url::Url;

/// Outcome of exactly one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The requested URL
    pub url: String,

    /// Non-overlapping occurrences of the target word (0 on failure)
    pub count: usize,

    /// HTTP status, when a response was received
    pub status: Option<u16>,

    /// Why the fetch failed, if it did
    pub error: Option<FetchError>,
}

impl FetchOutcome {
    /// Creates an outcome for a fetch that produced a count
    pub fn counted(url: &Url, status: Option<u16>, count: usize) -> Self {
        Self {
            url: url.to_string(),
            count,
            status,
            error: None,
        }
    }

    /// Creates an outcome for a failed fetch
    pub fn failed(url: &Url, status: Option<u16>, error: FetchError) -> Self {
        Self {
            url: url.to_string(),
            count: 0,
            status,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.url, self.count)?;
        if let Some(error) = &self.error {
            write!(f, "\t{}", error)?;
        }
        Ok(())
    }
}

/// Final report of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub scheduler: SchedulerReport,
    pub statistics: TallyStatistics,
}

/// Handle to a running pipeline
///
/// Requests go in through [`PipelineHandle::submit`]; results come out through
/// the reporter given to [`spawn_pipeline`].
pub struct PipelineHandle {
    requests: mpsc::Sender<Url>,
    cancel: CancellationToken,
    tasks: TaskTracker,
    scheduler: JoinHandle<SchedulerReport>,
    sink: JoinHandle<TallyStatistics>,
}

impl PipelineHandle {
    /// Queues a URL for fetching
    ///
    /// Waits while the request queue is full. Fails with
    /// [`TallyError::PipelineClosed`] once the pipeline has been cancelled.
    pub async fn submit(&self, url: Url) -> Result<(), TallyError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TallyError::PipelineClosed),
            sent = self.requests.send(url) => sent.map_err(|_| TallyError::PipelineClosed),
        }
    }

    /// Returns a sender feeding the request queue directly
    ///
    /// [`PipelineHandle::finish`] only drains once every clone has been dropped.
    pub fn sender(&self) -> mpsc::Sender<Url> {
        self.requests.clone()
    }

    /// Returns a clone of the shared cancellation token
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancels the pipeline without waiting for it to stop
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Number of fetch tasks currently running
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Closes the request queue and waits until every admitted request is reported
    pub async fn finish(self) -> Result<PipelineSummary, TallyError> {
        let PipelineHandle {
            requests,
            scheduler,
            sink,
            ..
        } = self;
        drop(requests);

        let scheduler = scheduler.await?;
        let statistics = sink.await?;
        tracing::info!(
            "Pipeline drained: {} requests admitted, {} results reported",
            scheduler.admitted,
            statistics.results
        );

        Ok(PipelineSummary {
            scheduler,
            statistics,
        })
    }

    /// Cancels the pipeline and waits for both loops to stop
    ///
    /// In-flight fetches are aborted and their results are not reported.
    pub async fn shutdown(self) -> Result<PipelineSummary, TallyError> {
        self.cancel.cancel();
        let PipelineHandle {
            scheduler, sink, ..
        } = self;

        let scheduler = scheduler.await?;
        let statistics = sink.await?;
        tracing::info!(
            "Pipeline cancelled: {} requests admitted, {} results reported",
            scheduler.admitted,
            statistics.results
        );

        Ok(PipelineSummary {
            scheduler,
            statistics,
        })
    }
}

/// Starts the scheduler and the result sink on the current runtime
///
/// # Arguments
///
/// * `config` - Admission control settings
/// * `fetcher` - Fetch implementation shared by every task
/// * `reporter` - Destination for results
pub fn spawn_pipeline<F, R>(
    config: &SchedulerConfig,
    fetcher: Arc<F>,
    reporter: R,
) -> PipelineHandle
where
    F: Fetch,
    R: ResultReporter + Send + 'static,
{
    let cancel = CancellationToken::new();
    let capacity = config.queue_capacity().max(1);
    let max_parallel = config.max_parallel.max(1) as usize;

    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (result_tx, result_rx) = mpsc::channel(capacity);

    let scheduler = Scheduler::new(
        fetcher,
        max_parallel,
        config.admission_backoff(),
        cancel.clone(),
    );
    let tasks = scheduler.tasks();
    let sink = ResultSink::new(reporter, cancel.clone());

    tracing::info!(
        "Starting pipeline: max {} parallel fetches, queue capacity {}",
        max_parallel,
        capacity
    );

    PipelineHandle {
        requests: request_tx,
        cancel,
        tasks,
        scheduler: tokio::spawn(scheduler.run(request_rx, result_tx)),
        sink: tokio::spawn(sink.run(result_rx)),
    }
}
