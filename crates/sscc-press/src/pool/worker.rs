use super::request::WorkRequest;
use crate::pipeline::batch::{Batch, TaskEvent};
use crate::{RenderContext, RenderError, RenderTask};
use crossbeam_channel::{Receiver, Sender};
use portable_atomic::{AtomicBool, Ordering};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Loop run by each worker thread.
///
/// Workers share one request queue, so a task is picked up by whichever
/// worker is free. The loop runs until a [`WorkRequest::Shutdown`] arrives or
/// the queue is disconnected.
///
/// # Request Types
///
/// - [`WorkRequest::Render`] - render one code via [`process_render`]. Skipped
///   once `closing` is set.
/// - [`WorkRequest::Shutdown`] - acknowledge and stop.
pub(crate) fn worker_loop(
    worker_id: usize,
    rx: Receiver<WorkRequest>,
    ctx: Arc<RenderContext>,
    closing: Arc<AtomicBool>,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    while let Ok(work) = rx.recv() {
        match work {
            WorkRequest::Render {
                slot,
                task,
                batch,
                events,
            } => {
                if closing.load(Ordering::Acquire) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("Worker {worker_id} dropping slot {slot}, pool is closing");
                    continue;
                }
                process_render(worker_id, slot, &task, batch, &events, &ctx);
            }
            WorkRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
}

/// Renders one task into its batch slot and reports the outcome.
///
/// Tasks of an aborted batch are discarded without rendering. The worker's
/// handle on the batch is released *before* the event is sent, so once the
/// submitter has seen every completion it holds the only reference.
#[allow(clippy::used_underscore_binding)]
fn process_render(
    _worker_id: usize,
    slot: usize,
    task: &RenderTask,
    batch: Arc<Batch>,
    events: &Sender<TaskEvent>,
    ctx: &RenderContext,
) {
    if batch.is_aborted() {
        #[cfg(feature = "tracing")]
        tracing::trace!("Worker {_worker_id} discarding slot {slot} of aborted batch");
        return;
    }

    let event = if batch.is_cancelled() {
        batch.abort();
        TaskEvent::Cancelled
    } else {
        let row = task.code().index() + 1;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run(ctx)))
            .unwrap_or(Err(RenderError::Panicked { row }));

        match outcome {
            Ok(image) => TaskEvent::Completed {
                filled: batch.fill(slot, image),
            },
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {_worker_id} failed slot {slot}: {error}");
                batch.abort();
                TaskEvent::Failed(error)
            }
        }
    };
    drop(batch);

    // The submitter stops listening after the first failure.
    if events.send(event).is_err() {
        #[cfg(feature = "tracing")]
        tracing::trace!("Worker {_worker_id} result for slot {slot} no longer wanted");
    }
}
