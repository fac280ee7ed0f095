//! Application configuration.
//!
//! Layered with the `config` crate: defaults, then an optional TOML file,
//! then `GENFLOW_*` environment overrides (e.g.
//! `GENFLOW_GENERATION__CHUNK_SIZE=64`).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::BatchError;
use crate::executor::ExecutorConfig;
use crate::logging::LoggingConfig;
use crate::progress::GENERATE_TOPIC;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Lines per model chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Per-item timeout in seconds; absent means wait indefinitely.
    #[serde(default)]
    pub item_timeout_secs: Option<u64>,

    /// Progress topic shared between generator and tracker.
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_chunk_size() -> usize {
    crate::generator::DEFAULT_CHUNK_SIZE
}

fn default_topic() -> String {
    GENERATE_TOPIC.to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            item_timeout_secs: None,
            topic: default_topic(),
        }
    }
}

impl GenerationConfig {
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            topic: self.topic.clone(),
            item_timeout: self.item_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenflowConfig {
    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, optionally from an explicit TOML file.
    pub fn load(path: Option<&Path>) -> Result<GenflowConfig, BatchError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            let path_str = path.to_str().ok_or_else(|| {
                BatchError::Config(format!("non-UTF-8 config path: {}", path.display()))
            })?;
            builder = builder.add_source(File::with_name(path_str));
        }
        builder = builder.add_source(Environment::with_prefix("GENFLOW").separator("__"));
        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }
}
