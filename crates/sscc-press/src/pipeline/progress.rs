use core::fmt;
use std::path::PathBuf;

/// A stage or progress update of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Reading,
    Validating { rows: usize },
    Rendering { done: usize, total: usize },
    Assembling { pages: usize },
    Saved { path: PathBuf },
    Failed { reason: String },
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading => f.write_str("Reading spreadsheet..."),
            Self::Validating { rows } => write!(f, "Validating {rows} rows..."),
            Self::Rendering { done, total } => write!(f, "Generated: {done} of {total}"),
            Self::Assembling { pages } => write!(f, "Building PDF ({pages} pages)..."),
            Self::Saved { path } => write!(f, "Done! Saved: {}", path.display()),
            Self::Failed { reason } => write!(f, "Error: {reason}"),
        }
    }
}

/// Receives status updates.
///
/// Only ever called from the thread that started the batch; workers report
/// through a channel that this thread drains.
pub trait ProgressSink {
    fn report(&mut self, status: Status);
}

/// Discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _status: Status) {}
}

/// Records every update, in order.
impl ProgressSink for Vec<Status> {
    fn report(&mut self, status: Status) {
        self.push(status);
    }
}
