//! Batch orchestrator.
//!
//! Runs the optimization pipeline over an ordered set of images with
//! per-item error isolation, fractional progress reporting, cooperative
//! cancellation, and the AI/default dual-strategy policy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{info, warn};
use rayon::prelude::*;

use crate::engine;
use crate::error::{Error, Result};
use crate::gateway::Enhance;
use crate::types::{
    ItemState, OptimizationOptions, OptimizationResult, ProcessedImage, SourceImage, Strategy,
};

/// Progress notification emitted after every attempted item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    /// Items attempted so far (success and failure both count)
    pub completed: usize,

    /// Total items in the batch
    pub total: usize,

    /// `completed / total * 100`; reaches exactly 100.0 after the last item
    pub percent: f64,
}

impl ProgressEvent {
    fn new(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            percent: completed as f64 / total as f64 * 100.0,
        }
    }
}

/// Outcome of applying the selected strategy to one item.
///
/// An explicit tagged result rather than nested error handling, so the item
/// state machine is total and testable without a network.
#[derive(Debug)]
pub enum StrategyOutcome {
    /// The AI path produced the result
    Ai(OptimizationResult),

    /// The deterministic engine produced the result
    Deterministic(OptimizationResult),

    /// Both applicable paths failed; the batch continues
    Failed(Error),
}

/// Orchestrates one batch run
pub struct BatchRunner<'a> {
    options: OptimizationOptions,
    strategy: Strategy,
    threads: usize,
    enhancer: Option<&'a (dyn Enhance + Sync)>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(options: OptimizationOptions, strategy: Strategy) -> Self {
        Self {
            options,
            strategy,
            threads: 1,
            enhancer: None,
        }
    }

    /// Attach the enhancement gateway used by `Strategy::AiWithFallback`
    pub fn with_enhancer(mut self, enhancer: &'a (dyn Enhance + Sync)) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    /// Process items on a thread pool of the given width. Output order and
    /// progress monotonicity are preserved either way.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Run the batch.
    ///
    /// Items are processed in the order supplied. Per-item failures are
    /// recorded on the item and never abort the run; the only whole-run
    /// error is a configuration problem detected before any item starts.
    /// `cancel` is checked before each item; items not yet started remain
    /// `Pending` and all items are returned regardless.
    pub fn run<F>(
        &self,
        images: Vec<SourceImage>,
        cancel: &AtomicBool,
        on_progress: F,
    ) -> Result<Vec<ProcessedImage>>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        self.options.validate()?;
        if self.strategy == Strategy::AiWithFallback && self.enhancer.is_none() {
            return Err(Error::Configuration(
                "strategy ai-with-fallback requires an enhancement gateway".to_string(),
            ));
        }

        let total = images.len();
        info!(
            "starting batch of {} images (strategy {:?}, {} threads)",
            total, self.strategy, self.threads
        );

        let processed = if self.threads > 1 {
            self.run_parallel(images, cancel, on_progress)?
        } else {
            self.run_sequential(images, cancel, on_progress)
        };

        let succeeded = processed
            .iter()
            .filter(|i| i.state == ItemState::Succeeded)
            .count();
        let failed = processed
            .iter()
            .filter(|i| i.state == ItemState::Failed)
            .count();
        info!("batch finished: {} ok, {} failed", succeeded, failed);

        Ok(processed)
    }

    fn run_sequential<F>(
        &self,
        images: Vec<SourceImage>,
        cancel: &AtomicBool,
        mut on_progress: F,
    ) -> Vec<ProcessedImage>
    where
        F: FnMut(ProgressEvent),
    {
        let total = images.len();
        let mut processed: Vec<ProcessedImage> =
            images.into_iter().map(ProcessedImage::new).collect();
        let mut completed = 0;

        for item in &mut processed {
            if cancel.load(Ordering::SeqCst) {
                info!("cancellation requested, leaving remaining items pending");
                break;
            }

            item.state = ItemState::Processing;
            let outcome = self.process_one(&item.source);
            apply_outcome(item, outcome);

            completed += 1;
            on_progress(ProgressEvent::new(completed, total));
        }

        processed
    }

    fn run_parallel<F>(
        &self,
        images: Vec<SourceImage>,
        cancel: &AtomicBool,
        on_progress: F,
    ) -> Result<Vec<ProcessedImage>>
    where
        F: FnMut(ProgressEvent) + Send,
    {
        let total = images.len();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build thread pool: {}", e)))?;

        let completed = AtomicUsize::new(0);
        let progress = Mutex::new(on_progress);

        // Collecting a parallel iterator preserves input order, so no
        // re-sort is needed before returning
        let processed = pool.install(|| {
            images
                .into_par_iter()
                .map(|source| {
                    let mut item = ProcessedImage::new(source);
                    if cancel.load(Ordering::SeqCst) {
                        return item;
                    }

                    item.state = ItemState::Processing;
                    let outcome = self.process_one(&item.source);
                    apply_outcome(&mut item, outcome);

                    // Count and notify under one lock so observers see a
                    // strictly increasing completed count
                    let mut notify = progress.lock().unwrap();
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    (*notify)(ProgressEvent::new(done, total));

                    item
                })
                .collect()
        });

        Ok(processed)
    }

    /// Apply the selected strategy to one image
    pub fn process_one(&self, image: &SourceImage) -> StrategyOutcome {
        match self.strategy {
            Strategy::Default => self.deterministic(image),
            Strategy::AiWithFallback => {
                // `run` guarantees an enhancer is attached for this strategy
                let enhancer = self.enhancer.expect("enhancer checked in run");
                match enhancer.enhance(image, &self.options) {
                    Ok(result) if within_bounds(&result, &self.options) => {
                        StrategyOutcome::Ai(result)
                    }
                    Ok(result) => {
                        warn!(
                            "{}: enhanced image is {}x{}, exceeding the configured \
                             bounds, falling back to deterministic path",
                            image.file_name, result.width, result.height
                        );
                        self.deterministic(image)
                    }
                    Err(e) => {
                        warn!(
                            "{}: enhancement failed ({}), falling back to deterministic path",
                            image.file_name, e
                        );
                        self.deterministic(image)
                    }
                }
            }
        }
    }

    fn deterministic(&self, image: &SourceImage) -> StrategyOutcome {
        match engine::optimize(image, &self.options) {
            Ok(result) => StrategyOutcome::Deterministic(result),
            Err(e) => StrategyOutcome::Failed(e),
        }
    }
}

/// A substituted result must honor the same dimension bounds the
/// deterministic path enforces, whatever the enhancer returned
fn within_bounds(result: &OptimizationResult, options: &OptimizationOptions) -> bool {
    options.max_width.map_or(true, |w| result.width <= w)
        && options.max_height.map_or(true, |h| result.height <= h)
}

fn apply_outcome(item: &mut ProcessedImage, outcome: StrategyOutcome) {
    match outcome {
        StrategyOutcome::Ai(result) => {
            item.state = ItemState::Succeeded;
            item.result = Some(result);
            item.ai_optimized = true;
        }
        StrategyOutcome::Deterministic(result) => {
            item.state = ItemState::Succeeded;
            item.result = Some(result);
            item.ai_optimized = false;
        }
        StrategyOutcome::Failed(e) => {
            warn!("{}: {}", item.source.file_name, e);
            item.state = ItemState::Failed;
            item.error = Some(e.to_string());
        }
    }
}
