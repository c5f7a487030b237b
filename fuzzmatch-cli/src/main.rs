//! Fuzzmatch CLI
//!
//! Command-line front-end for the remote fuzzy-match service: starts
//! matching jobs, follows them to completion, and fetches their reports.

mod commands;
mod config;
mod output;
mod scheduler;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "fuzzmatch_cli=info,fuzzmatch_client=info";

#[derive(Parser)]
#[command(name = "fuzzmatch")]
#[command(about = "Fuzzy record-matching job client", long_about = None)]
struct Cli {
    /// Match service URL
    #[arg(
        long,
        global = true,
        env = "FUZZMATCH_SERVICE_URL",
        default_value = "http://localhost:8080"
    )]
    service_url: String,

    /// Interval between status checks, in milliseconds
    #[arg(
        long,
        global = true,
        env = "FUZZMATCH_POLL_INTERVAL_MS",
        default_value_t = 1000
    )]
    poll_interval_ms: u64,

    /// Per-request HTTP timeout, in seconds
    #[arg(
        long,
        global = true,
        env = "FUZZMATCH_REQUEST_TIMEOUT_SECS",
        default_value_t = 30
    )]
    request_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so report content can be streamed to stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::new(cli.service_url)
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .with_request_timeout(Duration::from_secs(cli.request_timeout_secs));
    config.validate()?;

    handle_command(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_default_log_filter_shows_job_progress() {
        let filter = tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));

        let rendered = filter.to_string();
        assert!(rendered.contains("fuzzmatch_cli=info"));
        assert!(rendered.contains("fuzzmatch_client=info"));
    }
}
