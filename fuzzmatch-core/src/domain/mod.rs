//! Core domain types
//!
//! These types describe one run of a remote batch-matching job as seen by
//! the client: what was submitted, what the service reports back, and the
//! lifecycle phase derived from it.

pub mod job;
pub mod result;
pub mod state;
