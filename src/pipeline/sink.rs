//! Result sink: drains fetch outcomes into a reporter

use crate::output::{ResultReporter, TallyStatistics};
use crate::pipeline::FetchOutcome;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Reports outcomes in completion order until the queue closes or the token fires
pub struct ResultSink<R> {
    reporter: R,
    cancel: CancellationToken,
}

impl<R: ResultReporter> ResultSink<R> {
    pub fn new(reporter: R, cancel: CancellationToken) -> Self {
        Self { reporter, cancel }
    }

    /// Drains `results`, returning statistics for everything reported
    ///
    /// Cancellation takes priority over pending results: anything still queued
    /// when the token fires is discarded.
    pub async fn run(mut self, mut results: mpsc::Receiver<FetchOutcome>) -> TallyStatistics {
        let mut stats = TallyStatistics::default();

        loop {
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Result sink cancelled");
                    break;
                }
                next = results.recv() => match next {
                    Some(outcome) => outcome,
                    None => break,
                },
            };

            stats.record(&outcome);
            if let Err(e) = self.reporter.report(&outcome) {
                tracing::error!("Failed to report result for {}: {}", outcome.url, e);
            }
        }

        results.close();
        if let Err(e) = self.reporter.flush() {
            tracing::error!("Failed to flush reporter: {}", e);
        }

        stats
    }
}
