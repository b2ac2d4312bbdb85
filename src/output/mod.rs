//! Output module for reporting fetch results
//!
//! This module handles:
//! - The reporter interface used by the result sink
//! - Plain text lines for downstream tools
//! - Structured tracing events
//! - Run statistics

mod events;
pub mod stats;
mod text;
mod traits;

pub use events::LogReporter;
pub use stats::{write_statistics, TallyStatistics};
pub use text::LineReporter;
pub use traits::{OutputError, OutputResult, ResultReporter};

use crate::config::OutputFormat;

/// Builds the reporter for the configured format
///
/// Text output goes to stdout; log output goes through `tracing`.
pub fn reporter_for(format: OutputFormat) -> Box<dyn ResultReporter + Send> {
    match format {
        OutputFormat::Text => Box::new(LineReporter::new(std::io::stdout())),
        OutputFormat::Log => Box::new(LogReporter),
    }
}
