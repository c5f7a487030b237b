//! Job state as observed by the client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::result::{InvariantViolation, JobResult};

/// Progress text shown between a successful start and the first status report
pub const STARTING_PROGRESS: &str = "Starting fuzzy match job...";

/// Whole-state snapshot of one matching job
///
/// The service always returns the full record; the client replaces its copy
/// wholesale on every status check.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobState {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub results: Option<JobResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Client-side lifecycle of a job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobPhase {
    #[default]
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
}

impl JobState {
    /// State right after the service accepted a start request
    pub fn started(at: DateTime<Utc>) -> Self {
        Self {
            running: true,
            progress: STARTING_PROGRESS.to_string(),
            started_at: Some(at),
            ..Self::default()
        }
    }

    /// Derives the lifecycle phase from the record
    ///
    /// `Starting` is never derived; it only exists while a start request is
    /// in flight and no snapshot has been taken yet.
    pub fn phase(&self) -> JobPhase {
        if self.running {
            JobPhase::Running
        } else if self.results.is_some() {
            JobPhase::Completed
        } else if self.has_error() {
            JobPhase::Failed
        } else {
            JobPhase::Idle
        }
    }

    /// True if the job reported a terminal outcome
    pub fn is_terminal(&self) -> bool {
        self.results.is_some() || self.has_error()
    }

    /// An empty error string does not count as a job failure
    fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Checks the state invariant and the invariants of any attached result
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.results.is_some() && self.has_error() {
            return Err(InvariantViolation::ResultAndError);
        }

        if self.running && self.is_terminal() {
            return Err(InvariantViolation::RunningWithOutcome);
        }

        match &self.results {
            Some(results) => results.validate(),
            None => Ok(()),
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobPhase::Idle => "idle",
            JobPhase::Starting => "starting",
            JobPhase::Running => "running",
            JobPhase::Completed => "completed",
            JobPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::tests::sample_result;

    #[test]
    fn test_default_is_idle() {
        let state = JobState::default();
        assert_eq!(state.phase(), JobPhase::Idle);
        assert!(!state.is_terminal());
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_started_state() {
        let now = Utc::now();
        let state = JobState::started(now);

        assert!(state.running);
        assert!(state.results.is_none());
        assert!(state.error.is_none());
        assert_eq!(state.progress, STARTING_PROGRESS);
        assert_eq!(state.started_at, Some(now));
        assert_eq!(state.phase(), JobPhase::Running);
    }

    #[test]
    fn test_phase_derivation() {
        let completed = JobState {
            results: Some(sample_result()),
            ..JobState::default()
        };
        assert_eq!(completed.phase(), JobPhase::Completed);

        let failed = JobState {
            error: Some("source table is empty".to_string()),
            ..JobState::default()
        };
        assert_eq!(failed.phase(), JobPhase::Failed);

        let blank_error = JobState {
            error: Some(String::new()),
            ..JobState::default()
        };
        assert_eq!(blank_error.phase(), JobPhase::Idle);
    }

    #[test]
    fn test_invariants() {
        let both = JobState {
            results: Some(sample_result()),
            error: Some("boom".to_string()),
            ..JobState::default()
        };
        assert_eq!(both.validate(), Err(InvariantViolation::ResultAndError));

        let running_with_error = JobState {
            running: true,
            error: Some("boom".to_string()),
            ..JobState::default()
        };
        assert_eq!(
            running_with_error.validate(),
            Err(InvariantViolation::RunningWithOutcome)
        );
    }

    #[test]
    fn test_status_snapshot_deserialization() {
        let json = serde_json::json!({
            "running": false,
            "progress": "Complete",
            "started_at": "2024-01-01T10:00:00Z",
            "completed_at": "2024-01-01T10:02:13Z",
            "results": {
                "total_source": 1340,
                "total_target": 1502,
                "matched": 928,
                "unmatched_source": 412,
                "tier_distribution": {"1": 700, "3": 228},
                "confidence_stats": {"avg": 0.88, "min": 0.7, "max": 1.0},
                "low_confidence_count": 12,
                "all_matches_file": "all.csv",
                "low_confidence_file": null,
                "dry_run": true
            },
            "error": null
        });

        let state: JobState = serde_json::from_value(json).unwrap();
        assert_eq!(state.phase(), JobPhase::Completed);
        assert!(state.validate().is_ok());

        let results = state.results.unwrap();
        assert!(results.dry_run);
        assert_eq!(results.tier_distribution.get("3"), Some(&228));
        assert!(state.completed_at > state.started_at);
    }

    #[test]
    fn test_sparse_snapshot_uses_defaults() {
        let state: JobState = serde_json::from_str(r#"{"running": true}"#).unwrap();
        assert!(state.running);
        assert!(state.progress.is_empty());
        assert_eq!(state.started_at, None);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(JobPhase::Starting.to_string(), "starting");
        assert_eq!(JobPhase::Failed.to_string(), "failed");
    }
}
