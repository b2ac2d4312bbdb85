//! Reporter trait and output errors

use crate::pipeline::FetchOutcome;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for fetch outcomes
///
/// The result sink calls [`ResultReporter::report`] once per outcome, in
/// completion order, and [`ResultReporter::flush`] once when it stops.
pub trait ResultReporter {
    /// Reports a single outcome
    fn report(&mut self, outcome: &FetchOutcome) -> OutputResult<()>;

    /// Flushes anything buffered
    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

impl<R: ResultReporter + ?Sized> ResultReporter for Box<R> {
    fn report(&mut self, outcome: &FetchOutcome) -> OutputResult<()> {
        (**self).report(outcome)
    }

    fn flush(&mut self) -> OutputResult<()> {
        (**self).flush()
    }
}
