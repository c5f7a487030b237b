//! Fuzzmatch Core
//!
//! Core types shared by the fuzzy-match service client and its front-ends.
//!
//! This crate contains:
//! - Domain types: job configuration, job state, and job results
//! - DTOs: wire shapes exchanged with the match service

pub mod domain;
pub mod dto;
