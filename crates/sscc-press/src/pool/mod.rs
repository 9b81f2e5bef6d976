//! Bounded pool of render worker threads.
//!
//! ## Structure
//!
//! - [`manager`] - [`WorkerPool`](manager::WorkerPool): spawn, submit,
//!   shutdown.
//! - [`worker`] - the loop each worker thread runs.
//! - [`request`] - messages sent to workers.

pub mod manager;
pub mod request;
pub mod worker;
