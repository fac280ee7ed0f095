//! In-process event bus for progress events.
//!
//! Topic-keyed publish/subscribe with explicit handles. Delivery is
//! synchronous and best-effort: a subscriber registered after an event was
//! published never sees it, and there is no replay. Within one topic, events
//! reach a given subscriber in publish order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::progress::event::ProgressEvent;

type Handler = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Identifies one registered handler on one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    topic: String,
    id: u64,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    topics: HashMap<String, Vec<(u64, Handler)>>,
}

#[derive(Clone, Default)]
pub struct ProgressBus {
    inner: Arc<Mutex<BusState>>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every current subscriber of `topic`.
    ///
    /// Handlers run outside the bus lock, so a slow handler cannot block
    /// registration, but handlers must not re-enter the bus for the same
    /// reason they must be quick: publish is synchronous on the caller.
    pub fn publish(&self, topic: &str, event: ProgressEvent) {
        let handlers: Vec<Handler> = {
            let state = self.inner.lock();
            match state.topics.get(topic) {
                Some(subs) => subs.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => Vec::new(),
            }
        };
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscribe(
        &self,
        topic: &str,
        handler: impl Fn(ProgressEvent) + Send + Sync + 'static,
    ) -> SubscriptionHandle {
        let mut state = self.inner.lock();
        state.next_id += 1;
        let id = state.next_id;
        state
            .topics
            .entry(topic.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        SubscriptionHandle {
            topic: topic.to_string(),
            id,
        }
    }

    /// Remove exactly the handler behind `handle`. Idempotent: removing an
    /// already-removed handle returns `false`.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut state = self.inner.lock();
        let Some(subs) = state.topics.get_mut(&handle.topic) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(id, _)| *id != handle.id);
        let removed = subs.len() != before;
        if subs.is_empty() {
            state.topics.remove(&handle.topic);
        }
        removed
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .lock()
            .topics
            .get(topic)
            .map_or(0, |subs| subs.len())
    }

    /// Subscribe with guaranteed release: the returned guard unsubscribes on
    /// drop, including on panic and early-return paths.
    pub fn subscribe_scoped(
        &self,
        topic: &str,
        handler: impl Fn(ProgressEvent) + Send + Sync + 'static,
    ) -> SubscriptionGuard {
        let handle = self.subscribe(topic, handler);
        SubscriptionGuard {
            bus: self.clone(),
            handle: Some(handle),
        }
    }
}

/// RAII ownership of one bus subscription.
pub struct SubscriptionGuard {
    bus: ProgressBus,
    handle: Option<SubscriptionHandle>,
}

impl SubscriptionGuard {
    /// Release the subscription now instead of at drop.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.bus.unsubscribe(&handle);
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
