//! Word-Tally: a bounded-concurrency word counter for web pages
//!
//! This crate reads a stream of URLs, fetches each one over HTTP, counts the
//! occurrences of a target word in the response body, and reports results as
//! they complete while never running more than a configured number of fetches
//! at the same time.

pub mod config;
pub mod input;
pub mod output;
pub mod pipeline;

use thiserror::Error;

/// Main error type for Word-Tally operations
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline is no longer accepting requests")]
    PipelineClosed,

    #[error("Pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors carried inside a fetch outcome
///
/// These never abort the pipeline; each one belongs to exactly one request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("non-success status: {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    BodyRead(String),
}

impl FetchError {
    /// Short label used for grouping errors in statistics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Timeout => "timeout",
            FetchError::Status(_) => "status",
            FetchError::BodyRead(_) => "body-read",
        }
    }
}

/// Errors raised while turning input lines into URLs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Malformed URL '{line}': {reason}")]
    Parse { line: String, reason: String },

    #[error("Unsupported URL scheme '{scheme}' in '{line}'")]
    UnsupportedScheme { line: String, scheme: String },

    #[error("Input line is not valid UTF-8 '{line}': {reason}")]
    Encoding { line: String, reason: String },
}

/// Result type alias for Word-Tally operations
pub type Result<T> = std::result::Result<T, TallyError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{spawn_pipeline, FetchOutcome, PipelineHandle, WordCountClient};
