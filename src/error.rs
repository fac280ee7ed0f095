//! Error types for the batch generation system.

use std::time::Duration;
use thiserror::Error;

/// Item-level errors raised by a generation operation.
///
/// These never abort a batch: the executor records them per item and moves on
/// to the next file.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input value {value:?}: {source}")]
    InvalidInput {
        value: String,
        source: std::num::ParseFloatError,
    },

    #[error("model prediction failed: {0}")]
    Model(String),

    #[error("generation timed out after {limit:?}")]
    Timeout { limit: Duration },
}

/// Structural errors that abort a batch before or during execution.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no files selected")]
    EmptyBatch,

    #[error(
        "{live} stale subscriber(s) on topic {topic:?}; \
         refusing to run with corrupted progress attribution"
    )]
    SubscriptionLeak { topic: String, live: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for BatchError {
    fn from(err: config::ConfigError) -> Self {
        BatchError::Config(err.to_string())
    }
}
