//! Genflow CLI Binary
//!
//! Selects a batch of files, runs them through the chunked generator, and
//! renders per-file and overall progress.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use genflow::batch::Batch;
use genflow::config::{ConfigLoader, GenflowConfig};
use genflow::error::BatchError;
use genflow::executor::{BatchExecutor, BatchReport};
use genflow::generator::{ChunkedGenerator, PassthroughModel};
use genflow::logging::init_logging;
use genflow::progress::{ProgressBus, ProgressTracker};
use owo_colors::OwoColorize;
use tracing::{error, info};

/// Genflow CLI - sequential batch generation with streamed progress
#[derive(Parser)]
#[command(name = "genflow")]
#[command(about = "Run files through the generation pipeline, one at a time")]
struct Cli {
    /// Input files, processed in the given order
    files: Vec<PathBuf>,

    /// Configuration file path (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lines per model chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Per-file timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    verbose: bool,

    /// Suppress all logging
    #[arg(long, default_value = "false")]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };
    apply_cli_overrides(&cli, &mut config);

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }
    info!("Genflow CLI starting");

    let names: Vec<String> = cli
        .files
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let batch = Batch::new(names);

    let bus = ProgressBus::new();
    let tracker = ProgressTracker::new();
    let executor = Arc::new(BatchExecutor::with_config(
        bus.clone(),
        tracker.clone(),
        config.generation.executor_config(),
    ));
    let generator = ChunkedGenerator::new(PassthroughModel, bus)
        .with_topic(config.generation.topic.clone())
        .with_chunk_size(config.generation.chunk_size);

    let render = spawn_render_loop(Arc::clone(&executor));
    let result = executor.run(&generator, &batch).await;
    render.abort();

    match result {
        Ok(report) => {
            eprintln!();
            print_report(&batch, &executor, &report, cli.json);
            if !report.is_complete() {
                process::exit(2);
            }
        }
        Err(BatchError::EmptyBatch) => {
            eprintln!("Please select a file to process.");
            process::exit(1);
        }
        Err(e) => {
            error!("Batch aborted: {}", e);
            eprintln!("{}", format!("Batch aborted: {}", e).red());
            process::exit(1);
        }
    }
}

fn apply_cli_overrides(cli: &Cli, config: &mut GenflowConfig) {
    if let Some(chunk_size) = cli.chunk_size {
        config.generation.chunk_size = chunk_size;
    }
    if let Some(timeout) = cli.timeout {
        config.generation.item_timeout_secs = Some(timeout);
    }
    if cli.quiet {
        config.logging.level = "off".to_string();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.logging.format = format.clone();
    }
}

fn spawn_render_loop(executor: Arc<BatchExecutor>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(200));
        loop {
            ticker.tick().await;
            let per_item = executor.tracker().snapshot();
            let current = executor
                .tracker()
                .current_index()
                .map(|i| format!(" (file {} at {}%)", i + 1, per_item.get(i).copied().unwrap_or(0)))
                .unwrap_or_default();
            eprint!("\rOverall: {:>3}%{}    ", executor.aggregate_percent(), current);
        }
    })
}

fn print_report(batch: &Batch, executor: &BatchExecutor, report: &BatchReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("Failed to render report: {}", e),
        }
        return;
    }

    let per_item = executor.tracker().snapshot();
    for (index, item) in batch.iter().enumerate() {
        let percent = per_item.get(index).copied().unwrap_or(0);
        let failure = report.failures.iter().find(|f| f.index == index);
        match failure {
            Some(failure) => println!(
                "{} {:>3}%  {}  {}",
                "FAILED".red(),
                percent,
                item.name(),
                failure.error
            ),
            None => println!("{} {:>3}%  {}", "OK".green(), percent, item.name()),
        }
    }
    println!(
        "Overall: {}% ({}/{} succeeded)",
        executor.aggregate_percent(),
        report.total - report.failures.len(),
        report.total
    );
}
