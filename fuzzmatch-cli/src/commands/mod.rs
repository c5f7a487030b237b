//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod report;

use anyhow::{Context, Result};
use clap::Subcommand;
use fuzzmatch_client::MatchServiceClient;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start a matching job and follow it to completion
    Run(job::RunArgs),
    /// Show the current job status once
    Status {
        /// Print the raw status snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a report produced by a finished job
    Download {
        /// Report handle from a job result
        handle: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = build_client(config)?;

    match command {
        Commands::Run(args) => job::run_job(client, config, args).await,
        Commands::Status { json } => job::show_status(&client, json).await,
        Commands::Download { handle, output } => {
            report::download_report(&client, &handle, output).await
        }
    }
}

/// Builds the service client with the configured request timeout
fn build_client(config: &Config) -> Result<MatchServiceClient> {
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    Ok(MatchServiceClient::with_client(
        config.service_url.clone(),
        http_client,
    ))
}
