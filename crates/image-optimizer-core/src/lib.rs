//! Core functionality for batch image optimization.
//!
//! This library provides the foundational components of the pipeline:
//! - Codec adapter for decoding and re-encoding raster images
//! - Bounding-box resize policy
//! - Deterministic optimization engine (decode, constrain, re-encode, measure)
//! - AI augmentation gateway with transparent fallback
//! - Batch orchestrator with progress reporting and per-item error isolation

// -- Standard Library --
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

// -- External Dependencies --
use log::info;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use batch::{BatchRunner, ProgressEvent, StrategyOutcome};
pub use config::*;
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod batch;
pub mod codec;
pub mod config;
pub mod engine;
pub mod export;
pub mod gateway;
pub mod logging;
pub mod resize;
pub mod timeout;
pub mod types;

// -- Test Modules --
#[cfg(test)]
pub mod test_utils;

/// Main entry point for the optimization pipeline
pub struct ImageOptimizer {
    config: Config,
}

impl ImageOptimizer {
    /// Create a new ImageOptimizer with the provided configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the submitted files into memory
    pub fn load_images(&self, paths: &[impl AsRef<Path>]) -> Result<Vec<SourceImage>> {
        paths.iter().map(|p| SourceImage::from_path(p)).collect()
    }

    /// Run the configured batch over `images`.
    ///
    /// `cancel` is checked before each item; `on_progress` fires after every
    /// attempted item with the fraction completed.
    pub fn run<F>(
        &self,
        images: Vec<SourceImage>,
        cancel: &AtomicBool,
        on_progress: F,
    ) -> Result<Vec<ProcessedImage>>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        let runner = BatchRunner::new(self.config.options.clone(), self.config.strategy)
            .with_threads(self.config.worker_threads());

        match self.config.strategy {
            Strategy::Default => runner.run(images, cancel, on_progress),
            Strategy::AiWithFallback => {
                let gateway = gateway::GeminiGateway::new(&self.config)?;
                runner
                    .with_enhancer(&gateway)
                    .run(images, cancel, on_progress)
            }
        }
    }

    /// Export every succeeded item to the configured output directory
    pub fn export(&self, processed: &[ProcessedImage]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for item in processed {
            if item.state == ItemState::Succeeded {
                written.push(export::write_to_dir(item, &self.config.output_dir)?);
            }
        }
        info!(
            "exported {} of {} items to {}",
            written.len(),
            processed.len(),
            self.config.output_dir.display()
        );
        Ok(written)
    }
}
