//! Batch executor: drives items through the generation operation one at a
//! time and owns aggregate completion.
//!
//! Progress events carry no item identity, so attribution depends on exactly
//! one item holding a live subscription on the topic at any instant. The
//! executor enforces that with a scoped subscription per item and a
//! stale-subscriber check before each one.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::batch::{Batch, ItemId};
use crate::error::{BatchError, GenerateError};
use crate::generator::Generator;
use crate::progress::{ProgressBus, ProgressTracker, GENERATE_TOPIC};

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Topic the generation operation publishes progress on.
    pub topic: String,
    /// Upper bound on one item's generation time. `None` waits indefinitely,
    /// so an operation that never completes stalls the batch.
    pub item_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            topic: GENERATE_TOPIC.to_string(),
            item_timeout: None,
        }
    }
}

/// One recorded per-item failure. Item failures never abort the batch.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub id: ItemId,
    pub name: String,
    pub error: String,
}

/// Outcome of a run in which every item was attempted.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct BatchExecutor {
    bus: ProgressBus,
    tracker: ProgressTracker,
    aggregate: AtomicU8,
    config: ExecutorConfig,
}

impl BatchExecutor {
    pub fn new(bus: ProgressBus, tracker: ProgressTracker) -> Self {
        Self::with_config(bus, tracker, ExecutorConfig::default())
    }

    pub fn with_config(bus: ProgressBus, tracker: ProgressTracker, config: ExecutorConfig) -> Self {
        Self {
            bus,
            tracker,
            aggregate: AtomicU8::new(0),
            config,
        }
    }

    /// Fraction of items fully completed, as a percentage. Readable from
    /// other tasks while a run is in flight.
    pub fn aggregate_percent(&self) -> u8 {
        self.aggregate.load(Ordering::SeqCst)
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    /// Process `batch` strictly sequentially.
    ///
    /// Structural problems (empty batch, a stale subscriber on the topic)
    /// abort with `BatchError`; per-item generation failures are recorded in
    /// the report and the run continues.
    pub async fn run<G: Generator>(
        &self,
        generator: &G,
        batch: &Batch,
    ) -> Result<BatchReport, BatchError> {
        if batch.is_empty() {
            return Err(BatchError::EmptyBatch);
        }
        self.tracker.reset(batch.len());
        self.aggregate.store(0, Ordering::SeqCst);

        info!(items = batch.len(), topic = %self.config.topic, "batch started");

        let mut failures = Vec::new();
        for (index, item) in batch.iter().enumerate() {
            let live = self.bus.subscriber_count(&self.config.topic);
            if live != 0 {
                // A leaked handler would attribute this item's events to a
                // previous owner; that is a silent correctness bug, so abort.
                return Err(BatchError::SubscriptionLeak {
                    topic: self.config.topic.clone(),
                    live,
                });
            }

            self.tracker.begin_item(index);
            let outcome = {
                let tracker = self.tracker.clone();
                let _subscription = self
                    .bus
                    .subscribe_scoped(&self.config.topic, move |event| tracker.on_event(event));
                self.invoke(generator, item.name()).await
                // Guard drops here: the subscription is released before the
                // item is closed out, on success and failure alike.
            };
            self.tracker.end_item(index);

            let percent = ((index + 1) * 100 / batch.len()) as u8;
            self.aggregate.store(percent, Ordering::SeqCst);
            debug!(index, name = item.name(), aggregate = percent, "item attempted");

            if let Err(error) = outcome {
                warn!(index, name = item.name(), %error, "item failed; continuing");
                failures.push(ItemFailure {
                    index,
                    id: item.id(),
                    name: item.name().to_string(),
                    error: error.to_string(),
                });
            }
        }

        info!(items = batch.len(), failed = failures.len(), "batch finished");
        Ok(BatchReport {
            total: batch.len(),
            failures,
        })
    }

    async fn invoke<G: Generator>(
        &self,
        generator: &G,
        name: &str,
    ) -> Result<(), GenerateError> {
        match self.config.item_timeout {
            Some(limit) => tokio::time::timeout(limit, generator.invoke(name))
                .await
                .map_err(|_| GenerateError::Timeout { limit })?,
            None => generator.invoke(name).await,
        }
    }
}
