//! Statistics for a pipeline run
//!
//! The result sink folds every reported outcome into a [`TallyStatistics`],
//! which the binary prints when the run ends.

use crate::pipeline::FetchOutcome;
use std::collections::BTreeMap;
use std::io::Write;

/// Run statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TallyStatistics {
    /// Number of outcomes reported
    pub results: u64,

    /// Outcomes without an error
    pub succeeded: u64,

    /// Outcomes carrying an error
    pub failed: u64,

    /// Sum of all counts
    pub total_occurrences: u64,

    /// Responses with a non-2xx status, whatever the status policy
    pub non_success_statuses: u64,

    /// Failures grouped by error kind
    pub errors_by_kind: BTreeMap<&'static str, u64>,
}

impl TallyStatistics {
    /// Folds one outcome into the statistics
    pub fn record(&mut self, outcome: &FetchOutcome) {
        self.results += 1;
        self.total_occurrences += outcome.count as u64;

        if matches!(outcome.status, Some(code) if !(200..300).contains(&code)) {
            self.non_success_statuses += 1;
        }

        match &outcome.error {
            None => self.succeeded += 1,
            Some(error) => {
                self.failed += 1;
                *self.errors_by_kind.entry(error.kind()).or_insert(0) += 1;
            }
        }
    }
}

/// Writes statistics in a human readable form
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `out` - Destination, usually stderr so it does not mix with result lines
pub fn write_statistics<W: Write>(stats: &TallyStatistics, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "=== Word Tally Statistics ===")?;
    writeln!(out, "  Results reported: {}", stats.results)?;
    writeln!(out, "  Succeeded: {}", stats.succeeded)?;
    writeln!(out, "  Failed: {}", stats.failed)?;
    writeln!(out, "  Non-2xx responses: {}", stats.non_success_statuses)?;
    writeln!(out, "  Total occurrences: {}", stats.total_occurrences)?;

    if !stats.errors_by_kind.is_empty() {
        writeln!(out, "  Errors by kind:")?;
        for (kind, count) in &stats.errors_by_kind {
            writeln!(out, "    {}: {}", kind, count)?;
        }
    }

    Ok(())
}
