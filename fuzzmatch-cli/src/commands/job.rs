//! Job command handlers
//!
//! Starts matching jobs, follows their progress, and shows their status.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::*;
use fuzzmatch_client::{MatchService, MatchServiceClient};
use fuzzmatch_core::domain::job::{JobConfig, MAX_TIER, MIN_TIER};
use fuzzmatch_core::domain::state::JobPhase;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::report;
use crate::config::Config;
use crate::output::{print_job_error, print_result_summary, print_state};
use crate::scheduler::{JobPoller, JobStateReader};

/// Arguments of `fuzzmatch run`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// First tier to run
    #[arg(long, default_value_t = MIN_TIER)]
    min_tier: u8,

    /// Last tier to run, inclusive
    #[arg(long, default_value_t = MAX_TIER)]
    tier_limit: u8,

    /// Confidence at or above which matches are accepted automatically
    #[arg(long, default_value_t = 0.70)]
    threshold: f64,

    /// Persist accepted matches instead of doing a dry run
    #[arg(long)]
    apply: bool,

    /// Download all reports into this directory once the job completes
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

impl RunArgs {
    fn job_config(&self) -> JobConfig {
        JobConfig {
            min_tier: self.min_tier,
            tier_limit: self.tier_limit,
            auto_match_threshold: self.threshold,
            dry_run: !self.apply,
        }
    }
}

/// Start a job and follow it until it finishes or the user interrupts
pub async fn run_job(client: MatchServiceClient, config: &Config, args: RunArgs) -> Result<()> {
    let service: Arc<dyn MatchService> = Arc::new(client);
    let mut poller = JobPoller::new(service, config.poll_interval);
    let job_config = args.job_config();

    poller
        .start(job_config)
        .await
        .context("Failed to start fuzzy match job")?;

    println!(
        "{} Started {} over {} tiers ({}-{}, auto-match >= {:.2})",
        "▸".cyan(),
        if job_config.dry_run {
            "dry run".yellow()
        } else {
            "live run".red().bold()
        },
        job_config.tier_count(),
        job_config.min_tier,
        job_config.tier_limit,
        job_config.auto_match_threshold
    );

    follow_job(&mut poller, args.download_dir.as_deref(), ctrl_c()).await
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be watched
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Follows a started job until it ends or `interrupt` resolves
async fn follow_job(
    poller: &mut JobPoller,
    download_dir: Option<&Path>,
    interrupt: impl Future<Output = ()>,
) -> Result<()> {
    let progress = tokio::spawn(print_progress(poller.subscribe()));

    let finished = tokio::select! {
        _ = poller.wait() => true,
        _ = interrupt => false,
    };

    // Always stop the progress printer
    progress.abort();

    if !finished {
        poller.stop();
        info!("Interrupted, no longer observing the job");
        println!();
        println!(
            "{}",
            "Stopped watching. The job keeps running on the service; check it with `fuzzmatch status`."
                .yellow()
        );
        return Ok(());
    }

    let view = poller.view();
    match view.phase {
        JobPhase::Completed => {
            let Some(results) = view.state.results.as_ref() else {
                bail!("job completed without results");
            };

            print_result_summary(results);

            if let Some(dir) = download_dir {
                println!("\n{}", "Reports:".bold());
                report::download_all(poller, results, dir).await?;
            }

            println!();
            if results.dry_run {
                println!("{}", "Dry run: no changes were persisted.".dimmed());
            } else {
                println!(
                    "{}",
                    "Matches were persisted. Views showing matched records are now stale.".yellow()
                );
            }
            Ok(())
        }
        JobPhase::Failed => {
            let message = view.state.error.unwrap_or_default();
            print_job_error(&message);
            bail!("fuzzy match job failed: {}", message)
        }
        phase => {
            debug!(%phase, "Job ended without an outcome");
            println!(
                "{}",
                "Job stopped without reporting results or an error.".yellow()
            );
            Ok(())
        }
    }
}

/// Show the current status once
pub async fn show_status(client: &MatchServiceClient, json: bool) -> Result<()> {
    let state = client
        .job_status()
        .await
        .context("Failed to fetch job status")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_state(&state);
    }

    Ok(())
}

/// Prints each new progress message until the poller goes away
async fn print_progress(mut reader: JobStateReader) {
    let mut last = String::new();

    while reader.changed().await.is_ok() {
        let progress = reader.borrow_and_update().state.progress.clone();
        if !progress.is_empty() && progress != last {
            println!("  {} {}", "…".dimmed(), progress);
            last = progress;
        }
    }
}
