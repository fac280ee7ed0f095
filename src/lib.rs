//! Genflow: Sequential Batch Generation
//!
//! Runs a user-selected batch of files, one at a time, through a slow
//! generation operation while streaming fine-grained per-file progress to
//! observers over an in-process event bus.

pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod logging;
pub mod progress;
