use crate::{LabeledImage, RenderError};
use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Caller-side handle for cancelling a running batch.
///
/// Clones share the same flag. Tasks already rendering finish; tasks not yet
/// started are skipped and the batch fails with
/// [`Error::Cancelled`](crate::Error::Cancelled).
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Shared state of one in-flight batch.
///
/// Each slot is written exactly once, by the worker that rendered that slot's
/// task, so slots need no lock. `filled` only feeds progress reports.
pub(crate) struct Batch {
    slots: Box<[OnceLock<LabeledImage>]>,
    filled: AtomicUsize,
    aborted: AtomicBool,
    cancel: CancelToken,
}

impl Batch {
    pub(crate) fn new(len: usize, cancel: CancelToken) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
            filled: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
            cancel,
        }
    }

    /// Stores `image` in `slot` and returns the number of filled slots.
    pub(crate) fn fill(&self, slot: usize, image: LabeledImage) -> usize {
        let stored = self.slots[slot].set(image).is_ok();
        debug_assert!(stored, "slot {slot} written twice");
        self.filled.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Unpacks the slots in order. `None` if any slot is still empty.
    pub(crate) fn into_images(self) -> Option<Vec<LabeledImage>> {
        self.slots
            .into_vec()
            .into_iter()
            .map(OnceLock::into_inner)
            .collect()
    }
}

/// Outcome of one task, sent from a worker to the submitting thread.
pub(crate) enum TaskEvent {
    Completed { filled: usize },
    Failed(RenderError),
    Cancelled,
}
