use crate::output::traits::{OutputResult, ResultReporter};
use crate::pipeline::FetchOutcome;

/// Emits one `tracing` event per outcome
///
/// Successes are logged at `info`, failures at `warn`, with the URL, count,
/// status and error as fields.
pub struct LogReporter;

impl ResultReporter for LogReporter {
    fn report(&mut self, outcome: &FetchOutcome) -> OutputResult<()> {
        match &outcome.error {
            None => tracing::info!(
                url = %outcome.url,
                count = outcome.count,
                status = ?outcome.status,
                "result"
            ),
            Some(error) => tracing::warn!(
                url = %outcome.url,
                count = outcome.count,
                status = ?outcome.status,
                error = %error,
                "result"
            ),
        }
        Ok(())
    }
}
