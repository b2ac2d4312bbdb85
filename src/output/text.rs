use crate::output::traits::{OutputResult, ResultReporter};
use crate::pipeline::FetchOutcome;
use std::io::Write;

/// Writes one tab-separated line per outcome: `url`, `count`, then the error if any
pub struct LineReporter<W> {
    writer: W,
}

impl<W: Write> LineReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultReporter for LineReporter<W> {
    fn report(&mut self, outcome: &FetchOutcome) -> OutputResult<()> {
        writeln!(self.writer, "{}", outcome)?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
