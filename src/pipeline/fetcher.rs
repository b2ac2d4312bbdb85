//! HTTP fetcher implementation
//!
//! This module handles the single network operation of the pipeline:
//! - Building the shared HTTP client with timeouts and user agent
//! - One GET per URL, reading the full body
//! - Counting the target word as a literal, case-sensitive substring
//! - Error classification into [`FetchError`]

use crate::config::{Config, HttpConfig, StatusPolicy};
use crate::pipeline::FetchOutcome;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One fetch-and-count operation
///
/// Implementations never fail outright: every call produces exactly one
/// [`FetchOutcome`], with any error carried inside it. Dropping the returned
/// future must abort the request.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    async fn fetch(&self, url: &Url) -> FetchOutcome;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .gzip(true)
        .brotli(true);

    if let Some(connect_timeout_ms) = config.connect_timeout_ms {
        builder = builder.connect_timeout(Duration::from_millis(connect_timeout_ms));
    }

    builder.build()
}

/// Counts non-overlapping, case-sensitive occurrences of `word` in `text`
///
/// ```
/// use word_tally::pipeline::count_occurrences;
///
/// assert_eq!(count_occurrences("go Go asd13Goasd Go go", "Go"), 3);
/// assert_eq!(count_occurrences("aaaa", "aa"), 2);
/// ```
pub fn count_occurrences(text: &str, word: &str) -> usize {
    if word.is_empty() {
        return 0;
    }
    text.matches(word).count()
}

/// Fetches pages and counts the target word in each body
#[derive(Debug, Clone)]
pub struct WordCountClient {
    client: Client,
    word: Arc<str>,
    status_policy: StatusPolicy,
}

impl WordCountClient {
    /// Creates a client around an already built [`Client`]
    pub fn new(client: Client, word: impl Into<Arc<str>>, status_policy: StatusPolicy) -> Self {
        Self {
            client,
            word: word.into(),
            status_policy,
        }
    }

    /// Builds the HTTP client and word counter from configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config.http)?;
        Ok(Self::new(
            client,
            config.counter.word.as_str(),
            config.http.status_policy,
        ))
    }

    /// The word being counted
    pub fn word(&self) -> &str {
        &self.word
    }
}

#[async_trait]
impl Fetch for WordCountClient {
    /// Fetches a URL and counts the target word
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | 2xx, body read | count of the word |
    /// | non-2xx, lenient | count 0, no error |
    /// | non-2xx, strict | count 0, `Status` |
    /// | timeout | count 0, `Timeout` |
    /// | connect/DNS/TLS failure | count 0, `Transport` |
    /// | body read failure | count 0, `BodyRead` |
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::failed(url, None, classify_error(&e)),
        };

        let status = response.status();
        let code = status.as_u16();

        if !status.is_success() {
            tracing::debug!("Non-success status {} for {}", code, url);
            return match self.status_policy {
                StatusPolicy::Lenient => FetchOutcome::counted(url, Some(code), 0),
                StatusPolicy::Strict => {
                    FetchOutcome::failed(url, Some(code), FetchError::Status(code))
                }
            };
        }

        match response.text().await {
            Ok(body) => {
                let count = count_occurrences(&body, &self.word);
                FetchOutcome::counted(url, Some(code), count)
            }
            Err(e) if e.is_timeout() => FetchOutcome::failed(url, Some(code), FetchError::Timeout),
            Err(e) => {
                tracing::debug!("Failed to read body of {}: {}", url, e);
                FetchOutcome::failed(url, Some(code), FetchError::BodyRead(e.to_string()))
            }
        }
    }
}

fn classify_error(error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_connect() {
        FetchError::Transport(format!("connection failed: {}", error))
    } else {
        FetchError::Transport(error.to_string())
    }
}
