//! Word-Tally main entry point
//!
//! Reads URLs from stdin, one per line, and prints how often the target word
//! appears on each page as results complete.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use word_tally::config::{
    load_config_with_hash, validate, Config, InvalidUrlPolicy, StatusPolicy,
};
use word_tally::input::feed_lines;
use word_tally::output::{reporter_for, write_statistics};
use word_tally::{spawn_pipeline, WordCountClient};

/// Word-Tally: count a word across many web pages, a bounded number at a time
///
/// URLs are read from stdin until end of input or a blank line. Each result is
/// printed as `url<TAB>count[<TAB>error]` in completion order.
#[derive(Parser, Debug)]
#[command(name = "word-tally")]
#[command(version)]
#[command(about = "Count a word across web pages with bounded concurrency", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Word to count (case-sensitive substring)
    #[arg(short, long)]
    word: Option<String>,

    /// Maximum number of concurrent fetches
    #[arg(short = 'p', long)]
    max_parallel: Option<u32>,

    /// Per-fetch timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Report non-2xx responses as errors
    #[arg(long)]
    strict_status: bool,

    /// Stop everything on the first malformed input URL
    #[arg(long)]
    abort_on_invalid: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Loads the config file (if any) and applies command-line overrides
    fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                let (config, hash) = load_config_with_hash(path)
                    .with_context(|| format!("failed to load {}", path.display()))?;
                tracing::info!("Configuration loaded successfully (hash: {})", hash);
                config
            }
            None => Config::default(),
        };

        if let Some(word) = &self.word {
            config.counter.word = word.clone();
        }
        if let Some(max_parallel) = self.max_parallel {
            config.scheduler.max_parallel = max_parallel;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.http.timeout_ms = timeout_ms;
        }
        if self.strict_status {
            config.http.status_policy = StatusPolicy::Strict;
        }
        if self.abort_on_invalid {
            config.input.on_invalid_url = InvalidUrlPolicy::Abort;
        }

        validate(&config)?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli));
    // A pending stdin read would otherwise keep the runtime alive after cancellation
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return Err(e);
        }
    };

    let client = WordCountClient::from_config(&config).context("failed to build HTTP client")?;
    tracing::info!(
        "Counting '{}' with up to {} parallel fetches",
        client.word(),
        config.scheduler.max_parallel
    );

    let pipeline = spawn_pipeline(
        &config.scheduler,
        Arc::new(client),
        reporter_for(config.output.format),
    );

    let cancel = pipeline.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling pipeline");
            cancel.cancel();
        }
    });

    let input = feed_lines(
        BufReader::new(tokio::io::stdin()),
        &pipeline,
        config.input.on_invalid_url,
    )
    .await;

    // A failed stdin read still lets admitted requests finish and report
    let abandon = pipeline.is_cancelled() || matches!(&input, Ok(input) if input.aborted);
    let summary = if abandon {
        pipeline.shutdown().await?
    } else {
        pipeline.finish().await?
    };

    write_statistics(&summary.statistics, &mut std::io::stderr())?;

    let input = input?;
    if input.skipped > 0 {
        tracing::warn!("{} malformed input lines were skipped", input.skipped);
    }
    if input.aborted {
        anyhow::bail!("aborted on malformed input URL");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("word_tally=info,warn"),
            1 => EnvFilter::new("word_tally=debug,info"),
            2 => EnvFilter::new("word_tally=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
