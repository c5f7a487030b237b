//! In-memory match service shared by the scheduler and command tests

use async_trait::async_trait;
use fuzzmatch_client::{ClientError, MatchService};
use fuzzmatch_core::domain::job::JobConfig;
use fuzzmatch_core::domain::result::{ConfidenceStats, JobResult};
use fuzzmatch_core::domain::state::JobState;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{self, Duration, Instant};

use super::JobPoller;

pub(crate) const INTERVAL: Duration = Duration::from_secs(1);

/// Scripted response to one status check
pub(crate) enum Scripted {
    State(JobState),
    /// A 502 from a proxy in front of the service
    NetworkError,
    /// A 404 from the service itself
    Rejected,
}

/// Fake service; the last scripted state repeats forever
#[derive(Default)]
pub(crate) struct FakeService {
    pub reject_start: bool,
    pub panic_on_status: bool,
    pub started: Mutex<Vec<JobConfig>>,
    pub script: Mutex<VecDeque<Scripted>>,
    pub last: Mutex<Option<JobState>>,
    pub status_calls: Mutex<Vec<Instant>>,
    pub status_delay: Option<Duration>,
    /// Handles whose download fails after part of the body was written
    pub broken_reports: Vec<String>,
}

impl FakeService {
    pub fn scripted(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            reject_start: true,
            ..Self::default()
        })
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.lock().unwrap().len()
    }

    pub fn status_call_times(&self) -> Vec<Instant> {
        self.status_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MatchService for FakeService {
    async fn start_job(&self, config: &JobConfig) -> fuzzmatch_client::Result<()> {
        if self.reject_start {
            return Err(ClientError::api_error(500, "Internal Server Error"));
        }
        self.started.lock().unwrap().push(*config);
        Ok(())
    }

    async fn job_status(&self) -> fuzzmatch_client::Result<JobState> {
        if self.panic_on_status {
            panic!("status handler crashed");
        }

        self.status_calls.lock().unwrap().push(Instant::now());
        if let Some(delay) = self.status_delay {
            time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::State(state)) => {
                *self.last.lock().unwrap() = Some(state.clone());
                Ok(state)
            }
            Some(Scripted::NetworkError) => Err(ClientError::api_error(502, "Bad Gateway")),
            Some(Scripted::Rejected) => Err(ClientError::api_error(404, "Not Found")),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ClientError::ParseError("no status scripted".to_string())),
        }
    }

    async fn download_report(
        &self,
        handle: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> fuzzmatch_client::Result<u64> {
        let body = format!("report:{}", handle);
        writer.write_all(body.as_bytes()).await?;
        writer.flush().await?;

        if self.broken_reports.iter().any(|h| h == handle) {
            return Err(ClientError::api_error(502, "Bad Gateway"));
        }
        Ok(body.len() as u64)
    }
}

pub(crate) fn running(progress: &str) -> JobState {
    JobState {
        running: true,
        progress: progress.to_string(),
        ..JobState::default()
    }
}

pub(crate) fn dry_run_result() -> JobResult {
    JobResult {
        total_source: 1340,
        total_target: 1502,
        matched: 928,
        unmatched_source: 412,
        tier_distribution: BTreeMap::from([("1".to_string(), 700), ("4".to_string(), 228)]),
        confidence_stats: ConfidenceStats {
            avg: 0.9,
            min: 0.7,
            max: 1.0,
        },
        low_confidence_count: 40,
        all_matches_file: Some("all.csv".to_string()),
        low_confidence_file: Some("low.csv".to_string()),
        dry_run: true,
    }
}

pub(crate) fn completed_with(results: JobResult) -> JobState {
    JobState {
        running: false,
        progress: "Complete".to_string(),
        results: Some(results),
        ..JobState::default()
    }
}

pub(crate) fn completed() -> JobState {
    completed_with(dry_run_result())
}

pub(crate) fn failed(message: &str) -> JobState {
    JobState {
        running: false,
        progress: "Failed".to_string(),
        error: Some(message.to_string()),
        ..JobState::default()
    }
}

pub(crate) fn poller_for(service: &Arc<FakeService>) -> JobPoller {
    let service: Arc<dyn MatchService> = service.clone();
    JobPoller::new(service, INTERVAL)
}
