use crate::config::types::{Config, CounterConfig, HttpConfig, SchedulerConfig};
use crate::ConfigError;

/// Upper bound on `max-parallel`
const MAX_PARALLEL_LIMIT: u32 = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_counter_config(&config.counter)?;
    validate_scheduler_config(&config.scheduler)?;
    validate_http_config(&config.http)?;
    Ok(())
}

fn validate_counter_config(config: &CounterConfig) -> Result<(), ConfigError> {
    if config.word.is_empty() {
        return Err(ConfigError::Validation("word cannot be empty".to_string()));
    }

    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_parallel < 1 || config.max_parallel > MAX_PARALLEL_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-parallel must be between 1 and {}, got {}",
            MAX_PARALLEL_LIMIT, config.max_parallel
        )));
    }

    if config.queue_capacity == Some(0) {
        return Err(ConfigError::Validation(
            "queue-capacity must be >= 1".to_string(),
        ));
    }

    if config.admission_backoff_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "admission-backoff-ms must be >= 1ms, got {}ms",
            config.admission_backoff_ms
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.connect_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "connect-timeout-ms must be greater than 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
