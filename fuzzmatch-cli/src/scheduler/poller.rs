//! Job poller
//!
//! Starts a matching job on the service and polls its status until the job
//! reports a terminal outcome. Polling runs in its own task on a fixed
//! interval; the task is bound to a cancellation token held by the poller,
//! so stopping, clearing or dropping the poller always stops it. Once the
//! loop is gone the job record is no longer marked running, so it can be
//! cleared and a new job started.
//!
//! Stopping the poller only stops observing the job. The service keeps
//! running it.

use chrono::Utc;
use fuzzmatch_client::{ClientError, MatchService};
use fuzzmatch_core::domain::job::JobConfig;
use fuzzmatch_core::domain::state::{JobPhase, JobState};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{ClearError, StartError};

/// What readers of the poller see: the lifecycle phase plus the job record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobView {
    pub phase: JobPhase,
    pub state: JobState,
}

impl JobView {
    fn from_state(state: JobState) -> Self {
        Self {
            phase: state.phase(),
            state,
        }
    }
}

/// Read-only handle on the poller's current view
pub type JobStateReader = watch::Receiver<JobView>;

/// Result of a single status check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Snapshot applied; the job is still running
    Running,
    /// Snapshot applied; the job finished with results
    Completed,
    /// Snapshot applied; the job reported an error
    Failed,
    /// Snapshot applied; the job is no longer running but reported nothing
    Stopped,
    /// The check failed or returned a malformed snapshot; nothing applied
    Transient,
    /// A previous check was still in flight; nothing done
    Skipped,
}

impl PollOutcome {
    fn for_state(state: &JobState) -> Self {
        match state.phase() {
            JobPhase::Running | JobPhase::Starting => PollOutcome::Running,
            JobPhase::Completed => PollOutcome::Completed,
            JobPhase::Failed => PollOutcome::Failed,
            JobPhase::Idle => PollOutcome::Stopped,
        }
    }

    /// True if polling should end after this outcome
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            PollOutcome::Completed | PollOutcome::Failed | PollOutcome::Stopped
        )
    }
}

/// Counters collected by one run of the poll loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub polls: u32,
    pub transient_failures: u32,
    pub skipped: u32,
    pub cancelled: bool,
}

/// Cancels the poll loop and releases the job record when dropped
///
/// After the drop no snapshot is applied any more, and a record still
/// marked running keeps its progress but is no longer running.
struct PollGuard {
    token: CancellationToken,
    view: Arc<watch::Sender<JobView>>,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.token.cancel();
        self.view.send_if_modified(|view| {
            if !view.state.running {
                return false;
            }
            view.state.running = false;
            view.phase = view.state.phase();
            true
        });
    }
}

/// A running poll loop; cancelled when dropped
struct PollTask {
    guard: PollGuard,
    handle: JoinHandle<PollSummary>,
}

impl PollTask {
    /// Waits for the loop to end
    ///
    /// If this future is dropped before the loop ends, the guard goes with
    /// it and the loop is cancelled.
    async fn finish(self) -> Option<PollSummary> {
        let PollTask { guard, handle } = self;
        let finished = handle.await;
        drop(guard);

        match finished {
            Ok(summary) => Some(summary),
            Err(e) => {
                error!("Poll task panicked: {}", e);
                None
            }
        }
    }
}

/// Drives one matching job at a time through its lifecycle
pub struct JobPoller {
    service: Arc<dyn MatchService>,
    poll_interval: Duration,
    view: Arc<watch::Sender<JobView>>,
    /// Held for the duration of a status check
    in_flight: Arc<Mutex<()>>,
    task: Option<PollTask>,
}

impl JobPoller {
    /// Creates an idle poller
    pub fn new(service: Arc<dyn MatchService>, poll_interval: Duration) -> Self {
        let (view, _) = watch::channel(JobView::default());
        Self {
            service,
            poll_interval,
            view: Arc::new(view),
            in_flight: Arc::new(Mutex::new(())),
            task: None,
        }
    }

    /// Returns a handle that observes every change to the job view
    pub fn subscribe(&self) -> JobStateReader {
        self.view.subscribe()
    }

    /// Returns a copy of the current view
    pub fn view(&self) -> JobView {
        self.view.borrow().clone()
    }

    pub fn phase(&self) -> JobPhase {
        self.view.borrow().phase
    }

    /// Starts a job and begins polling its status
    ///
    /// Only allowed from `Idle`. On any failure the job record is left as
    /// it was.
    pub async fn start(&mut self, config: JobConfig) -> Result<(), StartError> {
        let phase = self.phase();
        // A leftover `Starting` means an earlier start was abandoned mid-call
        if !matches!(phase, JobPhase::Idle | JobPhase::Starting) {
            return Err(StartError::Busy(phase));
        }

        config.validate()?;

        self.view.send_modify(|view| view.phase = JobPhase::Starting);
        info!(
            min_tier = config.min_tier,
            tier_limit = config.tier_limit,
            threshold = config.auto_match_threshold,
            dry_run = config.dry_run,
            "Starting fuzzy match job"
        );

        if let Err(e) = self.service.start_job(&config).await {
            error!("Failed to start fuzzy match job: {}", e);
            self.view.send_modify(|view| view.phase = view.state.phase());
            return Err(StartError::Rejected(e));
        }

        self.view
            .send_replace(JobView::from_state(JobState::started(Utc::now())));
        self.task = Some(self.spawn_poll_loop());

        info!("Job accepted, polling every {:?}", self.poll_interval);
        Ok(())
    }

    /// Performs a single status check and applies the snapshot
    ///
    /// Does nothing unless a job is running.
    pub async fn poll(&self) -> PollOutcome {
        let running = self.view.borrow().state.running;
        let Some(task) = self.task.as_ref().filter(|_| running) else {
            debug!("No job running, nothing to poll");
            return PollOutcome::Stopped;
        };

        poll_once(
            self.service.as_ref(),
            &self.view,
            &self.in_flight,
            &task.guard.token,
        )
        .await
    }

    /// Waits until the poll loop ends and returns the final job record
    ///
    /// Returns immediately if no loop is running. Dropping the returned
    /// future stops the loop.
    pub async fn wait(&mut self) -> JobState {
        if let Some(task) = self.task.take() {
            if let Some(summary) = task.finish().await {
                debug!(
                    polls = summary.polls,
                    transient_failures = summary.transient_failures,
                    skipped = summary.skipped,
                    cancelled = summary.cancelled,
                    "Poll loop finished"
                );
            }
        }

        self.view.borrow().state.clone()
    }

    /// Stops observing the job
    ///
    /// The service keeps running it. The record keeps its last progress
    /// but is no longer running, so it can be cleared.
    pub fn stop(&mut self) {
        if self.task.take().is_some() {
            info!("Stopped polling; the job keeps running on the service");
        }
    }

    /// Resets the job record to its idle values
    pub fn clear(&mut self) -> Result<(), ClearError> {
        if self.view.borrow().state.running {
            return Err(ClearError::Running);
        }

        self.task = None;
        self.view.send_replace(JobView::default());
        debug!("Job state cleared");
        Ok(())
    }

    /// Streams a report from the service into `writer`
    pub async fn download(
        &self,
        handle: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, ClientError> {
        self.service.download_report(handle, writer).await
    }

    fn spawn_poll_loop(&self) -> PollTask {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_poll_loop(
            Arc::clone(&self.service),
            Arc::clone(&self.view),
            Arc::clone(&self.in_flight),
            self.poll_interval,
            token.clone(),
        ));

        PollTask {
            guard: PollGuard {
                token,
                view: Arc::clone(&self.view),
            },
            handle,
        }
    }
}

/// Polls on a fixed interval until a final outcome or cancellation
async fn run_poll_loop(
    service: Arc<dyn MatchService>,
    view: Arc<watch::Sender<JobView>>,
    in_flight: Arc<Mutex<()>>,
    poll_interval: Duration,
    token: CancellationToken,
) -> PollSummary {
    let mut summary = PollSummary::default();
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The first tick completes immediately; the first check is one interval out
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                summary.cancelled = true;
                break;
            }
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                summary.cancelled = true;
                break;
            }
            outcome = poll_once(service.as_ref(), &view, &in_flight, &token) => outcome,
        };

        summary.polls += 1;
        match outcome {
            PollOutcome::Transient => summary.transient_failures += 1,
            PollOutcome::Skipped => summary.skipped += 1,
            _ => {}
        }

        if outcome.is_final() {
            info!("Job finished: {:?}", outcome);
            break;
        }
    }

    if summary.cancelled {
        debug!("Poll loop cancelled; the job keeps running on the service");
    }
    summary
}

/// One status check: fetch, validate, overwrite
///
/// An identical snapshot does not notify readers. Nothing is applied once
/// `token` is cancelled.
async fn poll_once(
    service: &dyn MatchService,
    view: &watch::Sender<JobView>,
    in_flight: &Mutex<()>,
    token: &CancellationToken,
) -> PollOutcome {
    let Ok(_in_flight) = in_flight.try_lock() else {
        debug!("Previous status check still in flight, skipping tick");
        return PollOutcome::Skipped;
    };

    let snapshot = match service.job_status().await {
        Ok(snapshot) => snapshot,
        Err(e) if e.is_transient() => {
            warn!("Status check failed, retrying next tick: {}", e);
            return PollOutcome::Transient;
        }
        Err(e) => {
            // Not expected to clear up on its own, but the job may still finish
            error!("Status check rejected, retrying next tick: {}", e);
            return PollOutcome::Transient;
        }
    };

    if let Err(violation) = snapshot.validate() {
        warn!("Discarding malformed status snapshot: {}", violation);
        return PollOutcome::Transient;
    }

    let outcome = PollOutcome::for_state(&snapshot);
    let next = JobView::from_state(snapshot);
    let mut cancelled = false;
    // Checked under the channel lock so a concurrent guard drop always wins
    view.send_if_modified(|current| {
        if token.is_cancelled() {
            cancelled = true;
            false
        } else if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });

    if cancelled {
        debug!("Poller stopped during the status check, snapshot dropped");
        return PollOutcome::Stopped;
    }
    outcome
}
