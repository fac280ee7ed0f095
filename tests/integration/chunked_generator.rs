//! File-backed generation through the chunked generator.

use std::fs;

use genflow::batch::Batch;
use genflow::executor::BatchExecutor;
use genflow::generator::chunked::output_name;
use genflow::generator::{ChunkedGenerator, PassthroughModel};
use genflow::progress::{ProgressBus, ProgressTracker};
use tempfile::TempDir;

fn run_batch(names: Vec<String>, chunk_size: usize) -> (BatchExecutor, genflow::executor::BatchReport) {
    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = BatchExecutor::new(bus.clone(), tracker);
    let generator =
        ChunkedGenerator::new(PassthroughModel, bus).with_chunk_size(chunk_size);

    let report = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(executor.run(&generator, &Batch::new(names)))
        .unwrap();
    (executor, report)
}

#[test]
fn generates_predictions_and_reaches_full_progress() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("data.txt");
    fs::write(
        &input,
        "1 2 0.5 0.25\n3 4 0.1 0.9\n5 6 0.7 0.3\n7 8 0.2 0.8\n9 10 0.6 0.4\n",
    )
    .unwrap();

    let name = input.to_string_lossy().into_owned();
    let (executor, report) = run_batch(vec![name.clone()], 2);

    assert!(report.is_complete());
    assert_eq!(executor.aggregate_percent(), 100);
    assert_eq!(executor.tracker().item_percent(0), Some(100));

    let output = fs::read_to_string(output_name(&name)).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        "1\t2\t0.500000\t0.250000\t0.500000\t0.250000"
    );
    assert!(lines.iter().all(|l| l.split('\t').count() == 6));
}

#[test]
fn output_name_is_derived_from_the_input_name() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("my data.txt");
    fs::write(&input, "1 2 0.5 0.25\n").unwrap();

    let name = input.to_string_lossy().into_owned();
    let (_, report) = run_batch(vec![name.clone()], 2);

    assert!(report.is_complete());
    let expected = output_name(&name);
    assert!(expected.ends_with("my_data_generated.txt"));
    assert!(fs::metadata(expected).is_ok());
}

#[test]
fn short_rows_are_skipped_in_the_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("mixed.txt");
    fs::write(&input, "1 2 0.5 0.25\nnot enough\n3 4 0.1 0.9\n").unwrap();

    let name = input.to_string_lossy().into_owned();
    let (_, report) = run_batch(vec![name.clone()], 10);

    assert!(report.is_complete());
    let output = fs::read_to_string(output_name(&name)).unwrap();
    assert_eq!(output.lines().count(), 2);
}

#[test]
fn malformed_float_fails_the_item_but_not_the_batch() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.txt");
    fs::write(&bad, "1 2 oops 4\n").unwrap();
    let good = dir.path().join("good.txt");
    fs::write(&good, "1 2 0.5 0.25\n").unwrap();

    let (executor, report) = run_batch(
        vec![
            bad.to_string_lossy().into_owned(),
            good.to_string_lossy().into_owned(),
        ],
        2,
    );

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 0);
    assert!(report.failures[0].error.contains("invalid input value"));
    assert_eq!(executor.aggregate_percent(), 100);
    assert_eq!(executor.tracker().item_percent(1), Some(100));
}

#[test]
fn missing_file_is_an_item_failure() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.txt");

    let (executor, report) = run_batch(vec![missing.to_string_lossy().into_owned()], 2);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(executor.aggregate_percent(), 100);
}

#[test]
fn empty_file_completes_without_events() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("empty.txt");
    fs::write(&input, "").unwrap();

    let name = input.to_string_lossy().into_owned();
    let (executor, report) = run_batch(vec![name.clone()], 2);

    assert!(report.is_complete());
    // No events were published, so the slot stays at its reset value.
    assert_eq!(executor.tracker().item_percent(0), Some(0));
    assert_eq!(executor.aggregate_percent(), 100);
    assert!(fs::metadata(output_name(&name)).is_err());
}
