//! Thread pool for label rendering.
//!
//! This module defines the [`WorkerPool`] struct, which owns a fixed number of
//! OS threads pulling [`WorkRequest`]s from one shared queue. The pool size is
//! set once at construction and never grows with the input, so a large batch
//! only lengthens the queue.
//!
//! Shutdown is cooperative: the pool stops accepting work, asks every worker
//! to stop, and waits (bounded by a timeout) for acknowledgements.

use super::{request::WorkRequest, worker::worker_loop};
use crate::{Error, RenderContext, Result};
use core::time::Duration;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use portable_atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A fixed-size pool of render worker threads.
pub(crate) struct WorkerPool {
    queue: Sender<WorkRequest>,
    // Held so requests stranded by a shutdown can be dropped, which releases
    // their event senders and unblocks any waiting submitter.
    drain: Receiver<WorkRequest>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    closing: Arc<AtomicBool>,
    num_workers: usize,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Spawns `num_workers` threads sharing `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if `num_workers` is zero and
    /// [`Error::Io`] if the OS refuses to spawn a thread.
    pub(crate) fn spawn(
        num_workers: usize,
        ctx: Arc<RenderContext>,
        shutdown_timeout: Duration,
    ) -> Result<Self> {
        if num_workers == 0 {
            return Err(Error::WorkerUnavailable {
                context: "at least one worker is required".to_string(),
            });
        }

        let (queue, rx) = crossbeam_channel::unbounded();
        let closing = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(num_workers);

        for worker_id in 0..num_workers {
            let rx = rx.clone();
            let ctx = Arc::clone(&ctx);
            let closing = Arc::clone(&closing);
            // If this fails, dropping `queue` on return disconnects the
            // threads already spawned and they exit on their own.
            let handle = thread::Builder::new()
                .name(format!("sscc-render-{worker_id}"))
                .spawn(move || worker_loop(worker_id, rx, ctx, closing))?;
            handles.push(handle);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned {num_workers} render workers");

        Ok(Self {
            queue,
            drain: rx,
            handles: Mutex::new(handles),
            closing,
            num_workers,
            shutdown_timeout,
        })
    }

    pub(crate) const fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// Queues a request for the next free worker.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerUnavailable`] if the pool is shutting down.
    pub(crate) fn submit(&self, request: WorkRequest) -> Result<()> {
        if self.is_closing() {
            return Err(Error::WorkerUnavailable {
                context: "worker pool is shutting down".to_string(),
            });
        }

        self.queue
            .send(request)
            .map_err(|_| Error::WorkerUnavailable {
                context: "worker queue closed".to_string(),
            })
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// - Refuses new requests and tells workers to skip queued renders.
    /// - Sends a [`WorkRequest::Shutdown`] per worker.
    /// - Waits up to `shutdown_timeout` per worker for acknowledgements.
    /// - Drops any request still queued.
    ///
    /// Calling this more than once is a no-op.
    pub(crate) fn shutdown(&self) -> Result<()> {
        if self.closing.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying {} workers to shut down", self.num_workers);

        let mut acks = Vec::with_capacity(self.num_workers);
        for _i in 0..self.num_workers {
            let (tx, rx) = crossbeam_channel::bounded(1);
            if let Err(_e) = self.queue.send(WorkRequest::Shutdown { response: tx }) {
                #[cfg(feature = "tracing")]
                tracing::error!("Failed to send shutdown {_i}: {_e}");
            } else {
                acks.push(rx);
            }
        }

        let mut acknowledged = 0;
        for rx in acks {
            match rx.recv_timeout(self.shutdown_timeout) {
                Ok(()) => acknowledged += 1,
                Err(RecvTimeoutError::Timeout) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker shutdown timed out");
                }
                Err(RecvTimeoutError::Disconnected) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker exited without acknowledging shutdown");
                }
            }
        }

        let handles = core::mem::take(&mut *self.handles.lock());
        if acknowledged == self.num_workers {
            for handle in handles {
                if handle.join().is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker thread panicked during shutdown");
                }
            }
        }
        // Otherwise the handles are dropped and the stragglers detach.

        while self.drain.try_recv().is_ok() {}

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker pool shutdown complete ({acknowledged} acknowledged)");

        if acknowledged == self.num_workers {
            Ok(())
        } else {
            Err(Error::WorkerUnavailable {
                context: format!(
                    "{} of {} workers did not acknowledge shutdown",
                    self.num_workers - acknowledged,
                    self.num_workers
                ),
            })
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(_e) = self.shutdown() {
            #[cfg(feature = "tracing")]
            tracing::warn!("Worker pool dropped uncleanly: {_e}");
        }
    }
}
