//! Errors surfaced by the job poller
//!
//! Only start failures and clear refusals reach the caller. Status-check
//! failures stay inside the poll loop and are logged.

use fuzzmatch_client::ClientError;
use fuzzmatch_core::domain::job::ConfigError;
use fuzzmatch_core::domain::state::JobPhase;
use thiserror::Error;

/// Why a job could not be started; local state is left untouched
#[derive(Debug, Error)]
pub enum StartError {
    /// A job is running or its outcome has not been cleared yet
    #[error("cannot start a job while the poller is {0}")]
    Busy(JobPhase),

    /// The configuration was refused before anything was sent
    #[error("invalid job configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// The service did not accept the job
    #[error("match service rejected the job: {0}")]
    Rejected(#[source] ClientError),
}

/// Why the job state could not be cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClearError {
    #[error("cannot clear job state while the job is running")]
    Running,
}
