//! Report command handlers
//!
//! Report content is owned by the service and written out byte for byte.

use anyhow::{Context, Result, bail};
use colored::*;
use fuzzmatch_client::{MatchServiceClient, validate_report_handle};
use fuzzmatch_core::domain::result::JobResult;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tracing::warn;

use crate::scheduler::JobPoller;

/// Download a single report to a file or stdout
pub async fn download_report(
    client: &MatchServiceClient,
    handle: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    match output {
        Some(path) => {
            let mut file = File::create(&path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let written = client
                .download_report_to(handle, &mut file)
                .await
                .with_context(|| format!("Failed to download report {}", handle))?;
            eprintln!(
                "{} Saved {} ({} bytes)",
                "✓".green(),
                path.display().to_string().cyan(),
                written
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            client
                .download_report_to(handle, &mut stdout)
                .await
                .with_context(|| format!("Failed to download report {}", handle))?;
        }
    }

    Ok(())
}

/// Download every report of a finished job into `dir`
///
/// Files are named after their handles. Every handle is checked before
/// anything is created, and a report that fails midway is removed.
pub async fn download_all(poller: &JobPoller, results: &JobResult, dir: &Path) -> Result<()> {
    if results.report_handles().next().is_none() {
        println!("{}", "No reports to download.".yellow());
        return Ok(());
    }

    for handle in results.report_handles() {
        check_file_name(handle)?;
    }

    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    for handle in results.report_handles() {
        let path = dir.join(handle);
        let mut file = File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let written = match poller.download(handle, &mut file).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(&path).await {
                    warn!("Failed to remove partial report {}: {}", path.display(), remove_err);
                }
                return Err(e).with_context(|| format!("Failed to download report {}", handle));
            }
        };

        println!(
            "  {} Saved {} ({} bytes)",
            "✓".green(),
            path.display().to_string().cyan(),
            written
        );
    }

    Ok(())
}

/// A handle is only used as a file name if it is a plain name inside the directory
fn check_file_name(handle: &str) -> Result<()> {
    validate_report_handle(handle)?;

    if Path::new(handle).file_name() != Some(OsStr::new(handle)) {
        bail!("report handle is not a plain file name: {}", handle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_download_all_writes_each_report() {
        let service = FakeService::scripted(vec![]);
        let poller = poller_for(&service);
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reports");

        download_all(&poller, &dry_run_result(), &target)
            .await
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(target.join("all.csv")).unwrap(),
            "report:all.csv"
        );
        assert_eq!(
            std::fs::read_to_string(target.join("low.csv")).unwrap(),
            "report:low.csv"
        );
    }

    #[tokio::test]
    async fn test_download_all_rejects_escaping_handles() {
        let service = FakeService::scripted(vec![]);
        let poller = poller_for(&service);
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("reports");

        for handle in ["../escaped.csv", "/tmp/abs.csv", "nested/all.csv", ".."] {
            let mut results = dry_run_result();
            results.all_matches_file = Some("all.csv".to_string());
            results.low_confidence_file = Some(handle.to_string());

            let err = download_all(&poller, &results, &target).await;
            assert!(err.is_err(), "handle {handle:?} should be rejected");
        }

        // Rejected before any directory or file is created
        assert!(!target.exists());
        assert!(!root.path().join("escaped.csv").exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_partial_file() {
        let service = Arc::new(FakeService {
            broken_reports: vec!["low.csv".to_string()],
            ..FakeService::default()
        });
        let poller = poller_for(&service);
        let dir = tempfile::tempdir().unwrap();

        let err = download_all(&poller, &dry_run_result(), dir.path())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("low.csv"));
        assert!(dir.path().join("all.csv").exists());
        assert!(!dir.path().join("low.csv").exists());
    }
}
