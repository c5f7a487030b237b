//! Job configuration types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest tier the match service knows about (exact identifier matches)
pub const MIN_TIER: u8 = 1;

/// Highest tier the match service knows about (fuzzy/partial name matches)
pub const MAX_TIER: u8 = 7;

/// Configuration submitted to start a matching job
///
/// Serialized as-is for the service's `start` endpoint, so field names are
/// part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Lower bound of the tier range to run
    pub min_tier: u8,
    /// Upper bound of the tier range to run, inclusive
    pub tier_limit: u8,
    /// Confidence at or above which a match is accepted automatically
    pub auto_match_threshold: f64,
    /// Compute and report without persisting anything
    pub dry_run: bool,
}

/// Reasons a `JobConfig` is refused before it reaches the service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tier {0} is outside the supported range 1..=7")]
    TierOutOfRange(u8),

    #[error("tier_limit ({tier_limit}) must be >= min_tier ({min_tier})")]
    InvertedTierRange { min_tier: u8, tier_limit: u8 },

    #[error("auto_match_threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
}

impl JobConfig {
    /// Creates a dry-run configuration covering the given tier range
    pub fn dry_run(min_tier: u8, tier_limit: u8, auto_match_threshold: f64) -> Self {
        Self {
            min_tier,
            tier_limit,
            auto_match_threshold,
            dry_run: true,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for tier in [self.min_tier, self.tier_limit] {
            if !(MIN_TIER..=MAX_TIER).contains(&tier) {
                return Err(ConfigError::TierOutOfRange(tier));
            }
        }

        if self.tier_limit < self.min_tier {
            return Err(ConfigError::InvertedTierRange {
                min_tier: self.min_tier,
                tier_limit: self.tier_limit,
            });
        }

        // NaN fails the range check as well
        if !(0.0..=1.0).contains(&self.auto_match_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.auto_match_threshold));
        }

        Ok(())
    }

    /// Number of tiers covered by this configuration
    pub fn tier_count(&self) -> usize {
        usize::from(self.tier_limit.saturating_sub(self.min_tier)) + 1
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self::dry_run(MIN_TIER, MAX_TIER, 0.70)
    }
}
