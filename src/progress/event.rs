//! Event schema for progress observability.

use serde::{Deserialize, Serialize};

/// Well-known topic that generation operations publish progress on.
pub const GENERATE_TOPIC: &str = "generate";

/// A `{done, total}` progress report from the currently active item's
/// generation operation. Units are producer-defined (bytes, lines, rows);
/// only the ratio is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub done: u64,
    pub total: u64,
}

impl ProgressEvent {
    pub fn new(done: u64, total: u64) -> Self {
        Self { done, total }
    }

    /// Completion percentage, clamped to `[0, 100]`.
    ///
    /// `total == 0` violates the producer contract and yields `None` so the
    /// consumer can drop the event instead of dividing by zero.
    pub fn percent(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let pct = (self.done as u128 * 100) / self.total as u128;
        Some(pct.min(100) as u8)
    }
}
