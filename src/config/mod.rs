//! Configuration module for Word-Tally
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a missing file section simply falls back.
//!
//! # Example
//!
//! ```no_run
//! use word_tally::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("word-tally.toml")).unwrap();
//! println!("Counting '{}'", config.counter.word);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CounterConfig, HttpConfig, InputConfig, InvalidUrlPolicy, OutputConfig,
    OutputFormat, SchedulerConfig, StatusPolicy,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
