//! Scheduler layer for the CLI
//!
//! This layer drives one remote matching job from submission to its
//! terminal outcome by polling the service on a fixed interval. It owns
//! the single `JobState` record and publishes it to any number of readers.

pub mod error;
pub mod poller;

pub use error::{ClearError, StartError};
pub use poller::{JobPoller, JobStateReader, JobView, PollOutcome};

#[cfg(test)]
pub(crate) mod testing;
