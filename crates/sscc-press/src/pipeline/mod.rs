//! Ordered fan-out of render tasks over the worker pool.
//!
//! [`OrderedPipeline::run`] submits one [`RenderTask`] per code, then blocks
//! until every slot of the batch is filled or a task fails. Workers finish in
//! any order; the result is always in the order the codes were given.
//!
//! ## Structure
//!
//! - [`batch`] - write-once result slots, the abort flag, and [`CancelToken`].
//! - [`progress`] - [`Status`] updates and the [`ProgressSink`] trait.

pub(crate) mod batch;
mod progress;

#[cfg(test)]
mod tests;

pub use batch::CancelToken;
pub use progress::{NoProgress, ProgressSink, Status};

use crate::pool::{manager::WorkerPool, request::WorkRequest};
use crate::{
    CanonicalCode, Error, LabelComposer, LabeledImage, RenderContext, RenderTask, Result,
    SymbolRenderer,
};
use batch::{Batch, TaskEvent};
use core::time::Duration;
use std::sync::Arc;

/// Default number of render workers.
pub const DEFAULT_WORKERS: usize = 6;

/// Sizing of the render pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of worker threads. Fixed for the life of the pipeline.
    pub num_workers: usize,
    /// How long shutdown waits for each worker to acknowledge.
    pub shutdown_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            num_workers: DEFAULT_WORKERS,
            shutdown_timeout: Duration::from_secs(3),
        }
    }
}

/// Renders batches of codes on a bounded pool and returns them in input
/// order.
pub struct OrderedPipeline {
    pool: WorkerPool,
}

impl OrderedPipeline {
    /// Spawns the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] for a zero-sized pool and
    /// [`Error::Io`] if a worker thread cannot be spawned.
    pub fn new(
        config: PipelineConfig,
        renderer: Arc<dyn SymbolRenderer>,
        composer: LabelComposer,
    ) -> Result<Self> {
        let ctx = Arc::new(RenderContext::new(renderer, composer));
        let pool = WorkerPool::spawn(config.num_workers, ctx, config.shutdown_timeout)?;
        Ok(Self { pool })
    }

    pub const fn num_workers(&self) -> usize {
        self.pool.num_workers()
    }

    /// Renders `codes` and returns one image per code, in the same order.
    ///
    /// # Errors
    ///
    /// See [`OrderedPipeline::run_with_cancel`].
    pub fn run(
        &self,
        codes: Vec<CanonicalCode>,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<LabeledImage>> {
        self.run_with_cancel(codes, progress, &CancelToken::new())
    }

    /// Renders `codes`, stopping early if `cancel` is triggered.
    ///
    /// Blocks until every task has completed or the first one fails. On
    /// failure the batch is aborted: queued tasks are skipped and results
    /// already rendered are discarded.
    ///
    /// # Errors
    ///
    /// - [`Error::Render`] with the first task failure observed.
    /// - [`Error::Cancelled`] if `cancel` fired before all tasks started.
    /// - [`Error::WorkerUnavailable`] if the pool shut down mid-batch.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(codes = codes.len(), workers = self.num_workers())))]
    pub fn run_with_cancel(
        &self,
        codes: Vec<CanonicalCode>,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<Vec<LabeledImage>> {
        let total = codes.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        progress.report(Status::Rendering { done: 0, total });

        let batch = Arc::new(Batch::new(total, cancel.clone()));
        let (events_tx, events_rx) = crossbeam_channel::unbounded();

        for (slot, code) in codes.into_iter().enumerate() {
            let request = WorkRequest::Render {
                slot,
                task: RenderTask::new(code),
                batch: Arc::clone(&batch),
                events: events_tx.clone(),
            };
            if let Err(e) = self.pool.submit(request) {
                batch.abort();
                return Err(e);
            }
        }
        // Only in-flight requests hold senders now, so `recv` fails instead
        // of hanging if the pool drops them.
        drop(events_tx);

        let mut received = 0;
        let mut done = 0;
        while received < total {
            match events_rx.recv() {
                Ok(TaskEvent::Completed { filled }) => {
                    received += 1;
                    done = done.max(filled);
                    progress.report(Status::Rendering { done, total });
                }
                Ok(TaskEvent::Failed(error)) => {
                    batch.abort();
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Aborting batch after {done} of {total}: {error}");
                    return Err(error.into());
                }
                Ok(TaskEvent::Cancelled) => {
                    batch.abort();
                    #[cfg(feature = "tracing")]
                    tracing::info!("Batch cancelled after {done} of {total}");
                    return Err(Error::Cancelled);
                }
                Err(_) => {
                    batch.abort();
                    return Err(Error::WorkerUnavailable {
                        context: format!("workers stopped after {done} of {total} renders"),
                    });
                }
            }
        }

        // Workers release the batch before reporting, so after the last
        // completion this is the only handle left.
        Arc::try_unwrap(batch)
            .ok()
            .and_then(Batch::into_images)
            .ok_or_else(|| Error::WorkerUnavailable {
                context: "render results incomplete".to_string(),
            })
    }

    /// Stops the worker pool. Later runs fail with
    /// [`Error::WorkerUnavailable`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if some workers did not
    /// acknowledge in time.
    pub fn shutdown(&self) -> Result<()> {
        self.pool.shutdown()
    }
}
