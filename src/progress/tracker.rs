//! Per-item progress state for the current batch.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::progress::event::ProgressEvent;

#[derive(Default)]
struct TrackerState {
    per_item: Vec<u8>,
    current: Option<usize>,
    malformed_events: u64,
}

/// Tracks the percentage of each item in the active batch.
///
/// Exactly one item is "active" at a time; incoming events are attributed to
/// it. Cloning yields another handle to the same state, so a bus handler and
/// an observer can read and write concurrently.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<RwLock<TrackerState>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all per-item state with `item_count` zeros. Called whenever a
    /// new batch is selected.
    pub fn reset(&self, item_count: usize) {
        let mut state = self.inner.write();
        state.per_item = vec![0; item_count];
        state.current = None;
        state.malformed_events = 0;
    }

    /// Mark `index` as the active item. Does not touch its percentage;
    /// `reset` already zeroed it.
    pub fn begin_item(&self, index: usize) {
        self.inner.write().current = Some(index);
    }

    /// Clear the active item. The slot keeps whatever the last event
    /// reported; completion is never forced to 100 here.
    pub fn end_item(&self, index: usize) {
        let mut state = self.inner.write();
        if state.current != Some(index) {
            warn!(index, current = ?state.current, "end_item for an item that is not active");
        }
        state.current = None;
    }

    /// Attribute `event` to the active item, overwriting its percentage.
    ///
    /// Malformed events (`total == 0`) and events arriving with no active
    /// item are dropped without mutating per-item state.
    pub fn on_event(&self, event: ProgressEvent) {
        let mut state = self.inner.write();
        let Some(index) = state.current else {
            warn!(done = event.done, total = event.total, "progress event with no active item; dropped");
            return;
        };
        let Some(percent) = event.percent() else {
            state.malformed_events += 1;
            warn!(done = event.done, "progress event with total == 0; dropped");
            return;
        };
        state.per_item[index] = percent;
    }

    /// Per-item percentages, same length and order as the batch.
    pub fn snapshot(&self) -> Vec<u8> {
        self.inner.read().per_item.clone()
    }

    pub fn item_percent(&self, index: usize) -> Option<u8> {
        self.inner.read().per_item.get(index).copied()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.inner.read().current
    }

    /// Count of dropped `total == 0` events since the last reset.
    pub fn malformed_events(&self) -> u64 {
        self.inner.read().malformed_events
    }
}
