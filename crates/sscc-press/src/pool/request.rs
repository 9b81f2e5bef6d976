use crate::RenderTask;
use crate::pipeline::batch::{Batch, TaskEvent};
use crossbeam_channel::Sender;
use std::sync::Arc;

/// A message delivered to a worker thread.
pub(crate) enum WorkRequest {
    /// Render `task` and store the result in `batch` at `slot`, then report
    /// on `events`.
    Render {
        slot: usize,
        task: RenderTask,
        batch: Arc<Batch>,
        events: Sender<TaskEvent>,
    },
    /// Stop the worker. The worker acknowledges on `response` before exiting.
    Shutdown { response: Sender<()> },
}
