//! Line-oriented input for the pipeline
//!
//! Each input line holds one URL. A blank line or end of input finishes the
//! stream. Lines that are not usable http(s) URLs are handled according to
//! [`InvalidUrlPolicy`].

use crate::config::InvalidUrlPolicy;
use crate::pipeline::PipelineHandle;
use crate::{InputError, TallyError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use url::Url;

/// What happened while feeding input into the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputSummary {
    /// URLs handed to the pipeline
    pub submitted: u64,

    /// Malformed lines that were reported and skipped
    pub skipped: u64,

    /// Whether a malformed line cancelled the pipeline
    pub aborted: bool,
}

/// Parses one input line
///
/// # Returns
///
/// * `Ok(Some(Url))` - A usable http or https URL
/// * `Ok(None)` - A blank line, which ends the input
/// * `Err(InputError)` - The line is not a usable URL
pub fn parse_line(line: &str) -> Result<Option<Url>, InputError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(trimmed).map_err(|e| InputError::Parse {
        line: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(Some(url)),
        scheme => Err(InputError::UnsupportedScheme {
            line: trimmed.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

/// Decodes one raw input line
///
/// Invalid UTF-8 is a malformed line, not a read failure.
fn decode_line(raw: Vec<u8>) -> Result<String, InputError> {
    String::from_utf8(raw).map_err(|e| InputError::Encoding {
        line: String::from_utf8_lossy(e.as_bytes()).trim().to_string(),
        reason: e.utf8_error().to_string(),
    })
}

/// Reads URLs line by line and submits them to the pipeline
///
/// Stops at the first blank line, at end of input, or when the pipeline is
/// cancelled. Submitting waits while the request queue is full.
///
/// Under [`InvalidUrlPolicy::Abort`] a malformed line (including one that is
/// not valid UTF-8) cancels the pipeline and reading stops. Only real read
/// failures are returned as errors.
pub async fn feed_lines<R>(
    mut reader: R,
    pipeline: &PipelineHandle,
    policy: InvalidUrlPolicy,
) -> Result<InputSummary, TallyError>
where
    R: AsyncBufRead + Unpin,
{
    let cancel = pipeline.cancel_token();
    let mut summary = InputSummary::default();

    loop {
        let mut raw = Vec::new();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = reader.read_until(b'\n', &mut raw) => {
                if read? == 0 {
                    break;
                }
            }
        }

        match decode_line(raw).and_then(|line| parse_line(&line)) {
            Ok(Some(url)) => match pipeline.submit(url).await {
                Ok(()) => summary.submitted += 1,
                Err(TallyError::PipelineClosed) => break,
                Err(e) => return Err(e),
            },
            Ok(None) => {
                tracing::debug!("Blank line, end of input");
                break;
            }
            Err(e) => match policy {
                InvalidUrlPolicy::Skip => {
                    tracing::warn!("Skipping input line: {}", e);
                    summary.skipped += 1;
                }
                InvalidUrlPolicy::Abort => {
                    tracing::error!("Aborting on input line: {}", e);
                    pipeline.cancel();
                    summary.aborted = true;
                    break;
                }
            },
        }
    }

    tracing::debug!(
        "Input finished: {} submitted, {} skipped",
        summary.submitted,
        summary.skipped
    );
    Ok(summary)
}
