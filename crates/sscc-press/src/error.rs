//! Error types for the label pipeline.
//!
//! Every failure is terminal for the batch that produced it: nothing is
//! retried and no partial document is ever written.
//!
//! ## Error Cases
//! - `Validation`: one or more rows failed normalization. Carries every
//!   offending row, not just the first.
//! - `Render`: a single render task failed and aborted the batch.
//! - `Io`: reading the source or writing the output failed.
//! - `Spreadsheet`: the source workbook could not be opened or parsed.
//! - `Document`: the document writer rejected a page or could not encode it.
//! - `Font`: a label font could not be loaded.
//! - `EmptyBatch`: the source held no rows, so there is nothing to print.
//! - `Cancelled`: the caller cancelled the batch mid-flight.
//! - `WorkerUnavailable`: the worker pool is shut down or its channels closed.

use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for a label batch.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {context}")]
    Spreadsheet { context: String },

    #[error("Document error: {context}")]
    Document { context: String },

    #[error("Font error: {context}")]
    Font { context: String },

    #[error("No identifiers found in the source")]
    EmptyBatch,

    #[error("Batch cancelled")]
    Cancelled,

    #[error("Worker pool unavailable: {context}")]
    WorkerUnavailable { context: String },
}

/// Why a single row was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationReason {
    /// Nothing left after whitespace was removed.
    Empty,
    /// Not exactly 18 decimal digits once the tag was stripped.
    InvalidFormatOrLength,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::InvalidFormatOrLength => f.write_str("invalid format/length"),
        }
    }
}

/// A rejected row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Zero-based source row index.
    pub index: usize,
    pub reason: ViolationReason,
}

impl Violation {
    /// One-based row number as a spreadsheet user would count it.
    pub const fn row_number(&self) -> usize {
        self.index + 1
    }
}

/// Every violation found in a batch.
///
/// The display form lists the offending row numbers so a single message is
/// enough to fix the source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub(crate) const fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// One-based row numbers of every rejected row, in source order.
    pub fn row_numbers(&self) -> Vec<usize> {
        self.violations.iter().map(Violation::row_number).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Errors in rows: ")?;
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", violation.row_number())?;
        }
        Ok(())
    }
}

impl core::error::Error for ValidationError {}

/// Failure of a single render task.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// The symbol renderer cannot encode this data.
    #[error("Cannot encode {data:?}: {reason}")]
    Encoding { data: String, reason: String },

    /// The composed label would not fit in a raster.
    #[error("Cannot lay out label for row {row}: {reason}")]
    Layout { row: usize, reason: String },

    /// The task panicked on a worker thread.
    #[error("Render task for row {row} panicked")]
    Panicked { row: usize },
}
