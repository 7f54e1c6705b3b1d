use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{OptimizationOptions, Strategy};

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration for the image optimization pipeline.
///
/// Threaded explicitly through the entry point; neither the codec adapter
/// nor the engine reads ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default transcode parameters applied to every item
    pub options: OptimizationOptions,

    /// Processing path for batch runs
    pub strategy: Strategy,

    /// API key for the enhancement service; required for `AiWithFallback`
    pub api_key: Option<String>,

    /// Base URL of the enhancement service
    pub api_base: String,

    /// Model identifier sent to the enhancement service
    pub model: String,

    /// Upper bound on a single enhancement request, in seconds
    pub request_timeout_secs: u64,

    /// Number of worker threads (1 = sequential, 0 = one per CPU)
    pub threads: usize,

    /// Where exported images are written
    pub output_dir: PathBuf,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: OptimizationOptions::default(),
            strategy: Strategy::Default,
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-image".to_string(),
            request_timeout_secs: 30,
            threads: 1,
            output_dir: PathBuf::from("optimized"),
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Configuration(format!("failed to parse config: {}", e)))
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Validate configuration before any item is processed. A failure here
    /// is the only error that aborts a whole run.
    pub fn validate(&self) -> Result<()> {
        self.options.validate()?;

        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "request_timeout_secs must be positive".to_string(),
            ));
        }

        if self.strategy == Strategy::AiWithFallback
            && self.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::Configuration(
                "strategy ai-with-fallback requires an API key".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolved worker count for batch runs
    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}
