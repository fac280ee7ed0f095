//! End-to-end batch execution behavior: sequencing, aggregate completion,
//! and the partial-failure policy.

use std::sync::Arc;
use std::time::Duration;

use genflow::batch::Batch;
use genflow::error::{BatchError, GenerateError};
use genflow::executor::{BatchExecutor, ExecutorConfig};
use genflow::generator::Generator;
use genflow::progress::{ProgressBus, ProgressTracker};

use crate::integration::test_utils::ScriptedGenerator;

#[tokio::test]
async fn two_file_scenario_matches_reference_trace() {
    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = Arc::new(BatchExecutor::new(bus.clone(), tracker.clone()));
    let generator = ScriptedGenerator::new(bus, tracker.clone())
        .emits("a.txt", &[(1, 2), (2, 2)])
        .emits("b.txt", &[(5, 10)]);
    generator.attach_executor(Arc::clone(&executor));

    let batch = Batch::new(["a.txt", "b.txt"]);
    let report = executor.run(&generator, &batch).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(executor.aggregate_percent(), 100);
    assert_eq!(tracker.snapshot(), vec![100, 50]);

    let observed = generator.observations();
    assert_eq!(observed.len(), 2);

    assert_eq!(observed[0].name, "a.txt");
    assert_eq!(observed[0].aggregate_at_start, 0);
    assert_eq!(observed[0].after_each_event, vec![vec![50, 0], vec![100, 0]]);

    assert_eq!(observed[1].name, "b.txt");
    assert_eq!(observed[1].aggregate_at_start, 50);
    assert_eq!(observed[1].after_each_event, vec![vec![100, 50]]);
}

#[tokio::test]
async fn empty_batch_is_rejected_before_any_processing() {
    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = BatchExecutor::new(bus.clone(), tracker.clone());
    let generator = ScriptedGenerator::new(bus, tracker.clone());

    let batch = Batch::new(Vec::<String>::new());
    let result = executor.run(&generator, &batch).await;

    assert!(matches!(result, Err(BatchError::EmptyBatch)));
    assert!(tracker.snapshot().is_empty());
    assert_eq!(executor.aggregate_percent(), 0);
    assert!(generator.observations().is_empty());
}

#[tokio::test]
async fn silent_item_leaves_slot_at_zero_while_aggregate_advances() {
    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = BatchExecutor::new(bus.clone(), tracker.clone());
    let generator = ScriptedGenerator::new(bus, tracker.clone())
        .emits("quiet.txt", &[])
        .emits("loud.txt", &[(1, 1)]);

    let batch = Batch::new(["quiet.txt", "loud.txt"]);
    let report = executor.run(&generator, &batch).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(tracker.snapshot(), vec![0, 100]);
    assert_eq!(executor.aggregate_percent(), 100);
}

#[tokio::test]
async fn failed_item_is_recorded_and_batch_continues() {
    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = BatchExecutor::new(bus.clone(), tracker.clone());
    let generator = ScriptedGenerator::new(bus, tracker.clone())
        .fails("a.txt", "backend unavailable")
        .emits("b.txt", &[(1, 1)]);

    let batch = Batch::new(["a.txt", "b.txt"]);
    let report = executor.run(&generator, &batch).await.unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 0);
    assert_eq!(report.failures[0].name, "a.txt");
    assert!(report.failures[0].error.contains("backend unavailable"));
    assert_eq!(executor.aggregate_percent(), 100);
    assert_eq!(tracker.snapshot(), vec![0, 100]);
}

#[tokio::test]
async fn aggregate_reaches_100_for_any_non_empty_batch() {
    for size in 1..=5usize {
        let bus = ProgressBus::new();
        let tracker = ProgressTracker::new();
        let executor = BatchExecutor::new(bus.clone(), tracker.clone());
        let generator = ScriptedGenerator::new(bus, tracker.clone());

        let names: Vec<String> = (0..size).map(|i| format!("f{}.txt", i)).collect();
        let report = executor.run(&generator, &Batch::new(names)).await.unwrap();

        assert_eq!(report.total, size);
        assert_eq!(executor.aggregate_percent(), 100, "size {}", size);
    }
}

#[tokio::test]
async fn stale_subscriber_on_topic_aborts_the_run() {
    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = BatchExecutor::new(bus.clone(), tracker.clone());
    let generator = ScriptedGenerator::new(bus.clone(), tracker.clone());

    // Simulates a leaked handler from an earlier run.
    let _leak = bus.subscribe(executor.topic(), |_| {});

    let result = executor.run(&generator, &Batch::new(["a.txt"])).await;
    match result {
        Err(BatchError::SubscriptionLeak { live, .. }) => assert_eq!(live, 1),
        other => panic!("expected SubscriptionLeak, got {:?}", other.map(|_| ())),
    }
}

struct StalledGenerator;

impl Generator for StalledGenerator {
    async fn invoke(&self, _name: &str) -> Result<(), GenerateError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn configured_timeout_bounds_a_stalled_item() {
    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = BatchExecutor::with_config(
        bus.clone(),
        tracker.clone(),
        ExecutorConfig {
            item_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        },
    );

    let report = executor
        .run(&StalledGenerator, &Batch::new(["slow.txt"]))
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("timed out"));
    assert_eq!(executor.aggregate_percent(), 100);
    // The item's subscription was released despite the timeout.
    assert_eq!(bus.subscriber_count(executor.topic()), 0);
}
