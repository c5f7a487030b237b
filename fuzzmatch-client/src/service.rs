//! Service trait over the match service API
//!
//! The poller depends on this trait rather than on `MatchServiceClient`
//! directly so it can be driven by an in-memory double in tests.

use async_trait::async_trait;
use fuzzmatch_core::domain::job::JobConfig;
use fuzzmatch_core::domain::state::JobState;
use tokio::io::AsyncWrite;

use crate::MatchServiceClient;
use crate::error::Result;

/// Operations the job poller needs from the match service
#[async_trait]
pub trait MatchService: Send + Sync {
    /// Submits a job; succeeds only on a 2xx acceptance
    async fn start_job(&self, config: &JobConfig) -> Result<()>;

    /// Fetches the whole-state status snapshot
    async fn job_status(&self) -> Result<JobState>;

    /// Streams one report into `writer`, returning the number of bytes written
    async fn download_report(
        &self,
        handle: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;
}

#[async_trait]
impl MatchService for MatchServiceClient {
    async fn start_job(&self, config: &JobConfig) -> Result<()> {
        MatchServiceClient::start_job(self, config).await
    }

    async fn job_status(&self) -> Result<JobState> {
        MatchServiceClient::job_status(self).await
    }

    async fn download_report(
        &self,
        handle: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        self.download_report_to(handle, writer).await
    }
}
