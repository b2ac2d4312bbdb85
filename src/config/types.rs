use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Word-Tally
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub counter: CounterConfig,
    pub scheduler: SchedulerConfig,
    pub http: HttpConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// What to count
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Target word, matched as a literal, case-sensitive substring
    pub word: String,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            word: "Go".to_string(),
        }
    }
}

/// Admission control configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of concurrent fetches
    #[serde(rename = "max-parallel")]
    pub max_parallel: u32,

    /// Capacity of the request and result queues (defaults to max-parallel)
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: Option<u32>,

    /// Interval between rechecks while every fetch slot is busy (milliseconds)
    #[serde(rename = "admission-backoff-ms")]
    pub admission_backoff_ms: u64,
}

impl SchedulerConfig {
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.max_parallel) as usize
    }

    pub fn admission_backoff(&self) -> Duration {
        Duration::from_millis(self.admission_backoff_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            queue_capacity: None,
            admission_backoff_ms: 10,
        }
    }
}

/// How non-2xx responses are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Count 0, no error; the status code is still recorded
    #[default]
    Lenient,
    /// Count 0 with a `FetchError::Status`
    Strict,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-fetch timeout covering connect, headers and body (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: Option<u64>,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "status-policy")]
    pub status_policy: StatusPolicy,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            connect_timeout_ms: None,
            user_agent: format!("word-tally/{}", env!("CARGO_PKG_VERSION")),
            status_policy: StatusPolicy::Lenient,
        }
    }
}

/// What to do with a line that is not a usable URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidUrlPolicy {
    /// Report the line and keep reading
    #[default]
    Skip,
    /// Cancel the whole pipeline
    Abort,
}

/// Input reader configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    #[serde(rename = "on-invalid-url")]
    pub on_invalid_url: InvalidUrlPolicy,
}

/// Result report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One tab-separated line per result on stdout
    #[default]
    Text,
    /// One tracing event per result
    Log,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}
