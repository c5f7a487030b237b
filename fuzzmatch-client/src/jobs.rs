//! Job-related API endpoints

use fuzzmatch_core::domain::job::JobConfig;
use fuzzmatch_core::domain::state::JobState;
use reqwest::Url;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::MatchServiceClient;
use crate::error::{ClientError, Result};

impl MatchServiceClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Start a matching job
    ///
    /// The response body is ignored; any 2xx status counts as acceptance.
    ///
    /// # Example
    /// ```no_run
    /// # use fuzzmatch_client::MatchServiceClient;
    /// # use fuzzmatch_core::domain::job::JobConfig;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = MatchServiceClient::new("http://localhost:8080");
    /// client.start_job(&JobConfig::dry_run(1, 7, 0.70)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_job(&self, config: &JobConfig) -> Result<()> {
        let url = self.endpoint("start");
        debug!(?config, "Starting fuzzy match job");
        let response = self.client.post(&url).json(config).send().await?;

        self.handle_empty_response(response).await
    }

    /// Get the current job status
    ///
    /// # Returns
    /// The whole-state snapshot of the job
    pub async fn job_status(&self) -> Result<JobState> {
        let url = self.endpoint("status");
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Reports
    // =============================================================================

    /// Open a report download
    ///
    /// The content is owned by the service and returned untouched.
    ///
    /// # Arguments
    /// * `handle` - A report handle from a prior `JobResult`
    pub async fn download_report(&self, handle: &str) -> Result<reqwest::Response> {
        validate_report_handle(handle)?;

        let url = self.download_url(handle)?;
        let response = self.client.get(url).send().await?;

        match self.check_status(response).await {
            Err(e) if e.is_not_found() => Err(ClientError::NotFound(handle.to_string())),
            other => other,
        }
    }

    /// Stream a report into `writer`
    ///
    /// # Returns
    /// The number of bytes written
    pub async fn download_report_to<W>(&self, handle: &str, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut response = self.download_report(handle).await?;
        let mut written = 0u64;

        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        debug!(handle, bytes = written, "Downloaded report");
        Ok(written)
    }

    /// `download/{handle}` with the handle as a single percent-encoded segment
    fn download_url(&self, handle: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint("download"))
            .map_err(|e| ClientError::InvalidRequest(format!("invalid service URL: {}", e)))?;

        let url_str = url.to_string();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!("service URL cannot take a path: {}", url_str))
            })?
            .push(handle);

        Ok(url)
    }
}

/// Rejects handles that would escape the download endpoint
///
/// Callers that turn a handle into a local file name use the same check.
pub fn validate_report_handle(handle: &str) -> Result<()> {
    if handle.is_empty() {
        return Err(ClientError::InvalidRequest(
            "report handle cannot be empty".to_string(),
        ));
    }

    if handle.contains('/') || handle.contains('\\') || handle.contains("..") {
        return Err(ClientError::InvalidRequest(format!(
            "invalid report handle: {}",
            handle
        )));
    }

    Ok(())
}
