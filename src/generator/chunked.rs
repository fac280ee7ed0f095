//! Chunked file generator.
//!
//! Streams an input file line by line, runs each chunk of parsed rows through
//! the model, and appends the predictions to `<name>_generated.txt`. After
//! every chunk it publishes a `{bytes_read, file_size}` progress event on the
//! generation topic.

use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write as _};

use tracing::{debug, info};

use crate::error::GenerateError;
use crate::generator::model::{HarmonicModel, InputRow};
use crate::generator::Generator;
use crate::progress::{ProgressBus, ProgressEvent, GENERATE_TOPIC};

/// Lines accumulated before a chunk is run through the model.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

pub struct ChunkedGenerator<M> {
    model: M,
    bus: ProgressBus,
    topic: String,
    chunk_size: usize,
}

impl<M: HarmonicModel> ChunkedGenerator<M> {
    pub fn new(model: M, bus: ProgressBus) -> Self {
        Self {
            model,
            bus,
            topic: GENERATE_TOPIC.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn generate(&self, name: &str) -> Result<(), GenerateError> {
        let out_name = output_name(name);
        // Stale output from a previous run would otherwise be appended to.
        let _ = fs::remove_file(&out_name);

        let file = File::open(name)?;
        let total_bytes = file.metadata()?.len();
        let reader = BufReader::new(file);

        info!(file = name, output = %out_name, total_bytes, "generating");

        let mut lines: Vec<String> = Vec::new();
        let mut bytes_read: u64 = 0;
        for line in reader.lines() {
            let line = line?;
            bytes_read += line.len() as u64 + 1;
            lines.push(line);

            if lines.len() < self.chunk_size {
                continue;
            }
            self.generate_chunk(&out_name, &lines)?;
            lines.clear();
            self.bus.publish(
                &self.topic,
                ProgressEvent::new(bytes_read.min(total_bytes), total_bytes),
            );
        }
        if !lines.is_empty() {
            self.generate_chunk(&out_name, &lines)?;
        }
        if total_bytes > 0 {
            self.bus
                .publish(&self.topic, ProgressEvent::new(total_bytes, total_bytes));
        }

        info!(file = name, "generation finished");
        Ok(())
    }

    fn generate_chunk(&self, out_name: &str, lines: &[String]) -> Result<(), GenerateError> {
        let rows = parse_rows(lines)?;
        if rows.is_empty() {
            return Ok(());
        }
        let predictions = self.model.predict(&rows)?;
        debug!(rows = rows.len(), "chunk predicted");

        let mut text = String::new();
        for (row, harmonic) in rows.iter().zip(predictions.iter()) {
            // Row format: p and q are integral, the rest are floats.
            let _ = writeln!(
                text,
                "{}\t{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
                row.p as i64, row.q as i64, row.theta, row.phi, harmonic.re, harmonic.im
            );
        }
        append_to_file(out_name, &text)
    }
}

impl<M: HarmonicModel> Generator for ChunkedGenerator<M> {
    async fn invoke(&self, name: &str) -> Result<(), GenerateError> {
        self.generate(name)
    }
}

/// Derived output file name: spaces become underscores, any `.txt` is
/// stripped, and `_generated.txt` is appended.
pub fn output_name(name: &str) -> String {
    let base = name.replace(' ', "_").replace(".txt", "");
    format!("{base}_generated.txt")
}

/// Parse rows of at least four whitespace-separated floats. Rows with fewer
/// than four fields are skipped; an unparsable float is an error.
fn parse_rows(lines: &[String]) -> Result<Vec<InputRow>, GenerateError> {
    let mut rows = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }
        let mut values = [0f32; 4];
        for (slot, field) in values.iter_mut().zip(fields.iter()) {
            *slot = field
                .parse::<f32>()
                .map_err(|source| GenerateError::InvalidInput {
                    value: field.to_string(),
                    source,
                })?;
        }
        rows.push(InputRow {
            p: values[0],
            q: values[1],
            theta: values[2],
            phi: values[3],
        });
    }
    Ok(rows)
}

fn append_to_file(name: &str, text: &str) -> Result<(), GenerateError> {
    let mut file = OpenOptions::new().append(true).create(true).open(name)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}
