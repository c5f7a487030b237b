//! Job result types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Snapshot of a finished matching job, as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub total_source: u64,
    pub total_target: u64,
    pub matched: u64,
    #[serde(alias = "unmatched_freed")]
    pub unmatched_source: u64,
    /// Matches attributed to each tier, keyed by tier ordinal ("1".."7")
    #[serde(default)]
    pub tier_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub confidence_stats: ConfidenceStats,
    /// Matches below the review threshold; counted independently of tiers
    #[serde(default)]
    pub low_confidence_count: u64,
    /// Download handle for the full match report
    #[serde(default)]
    pub all_matches_file: Option<String>,
    /// Download handle for the low-confidence report
    #[serde(default)]
    pub low_confidence_file: Option<String>,
    pub dry_run: bool,
}

/// Confidence summary over all matched pairs
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// A broken rule in a reported result or state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("matched ({matched}) + unmatched_source ({unmatched}) exceeds total_source ({total})")]
    CountsExceedSource {
        matched: u64,
        unmatched: u64,
        total: u64,
    },

    #[error("tier distribution overflows a 64-bit count")]
    TierSumOverflow,

    #[error("tier distribution sums to {sum}, expected matched = {matched}")]
    TierSumMismatch { sum: u64, matched: u64 },

    #[error("confidence {name} = {value} is outside [0, 1]")]
    ConfidenceOutOfRange { name: &'static str, value: f64 },

    #[error("confidence stats are not ordered: min {min}, avg {avg}, max {max}")]
    ConfidenceUnordered { min: f64, avg: f64, max: f64 },

    #[error("state carries both results and an error")]
    ResultAndError,

    #[error("state is running but already carries an outcome")]
    RunningWithOutcome,
}

impl JobResult {
    /// Checks the counting and confidence rules of a well-formed result
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if self.matched.saturating_add(self.unmatched_source) > self.total_source {
            return Err(InvariantViolation::CountsExceedSource {
                matched: self.matched,
                unmatched: self.unmatched_source,
                total: self.total_source,
            });
        }

        let sum = self
            .tier_total()
            .ok_or(InvariantViolation::TierSumOverflow)?;
        if sum != self.matched {
            return Err(InvariantViolation::TierSumMismatch {
                sum,
                matched: self.matched,
            });
        }

        self.confidence_stats.validate()
    }

    /// Sum of all tier counts, `None` if it does not fit in a `u64`
    pub fn tier_total(&self) -> Option<u64> {
        self.tier_distribution
            .values()
            .try_fold(0u64, |total, count| total.checked_add(*count))
    }

    /// Fraction of source records that were matched
    pub fn match_rate(&self) -> f64 {
        if self.total_source == 0 {
            return 0.0;
        }
        self.matched as f64 / self.total_source as f64
    }

    /// Report handles present on this result: all matches first, then low confidence
    pub fn report_handles(&self) -> impl Iterator<Item = &str> {
        self.all_matches_file
            .iter()
            .chain(self.low_confidence_file.iter())
            .map(String::as_str)
    }
}

impl ConfidenceStats {
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for (name, value) in [("avg", self.avg), ("min", self.min), ("max", self.max)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(InvariantViolation::ConfidenceOutOfRange { name, value });
            }
        }

        if self.min > self.avg || self.avg > self.max {
            return Err(InvariantViolation::ConfidenceUnordered {
                min: self.min,
                avg: self.avg,
                max: self.max,
            });
        }

        Ok(())
    }
}
