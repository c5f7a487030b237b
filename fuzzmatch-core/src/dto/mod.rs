//! Data Transfer Objects for talking to the match service
//!
//! Request and status bodies are the domain types themselves (`JobConfig`
//! and `JobState`); this module holds the shapes that only exist on the wire.

pub mod job;
