//! Row normalization and SSCC validation.
//!
//! A batch is accepted or rejected as a unit: [`validate`] checks every row
//! and either returns a [`CanonicalCode`] for each of them or a
//! [`ValidationError`] naming every row that failed.

use crate::{ValidationError, Violation, ViolationReason};

/// Application-identifier tag that marks an SSCC payload.
pub const AI_TAG: &str = "(00)";

/// Number of digits in an SSCC payload.
pub const PAYLOAD_LEN: usize = 18;

/// A raw cell as read from the source, before any normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRow {
    /// Zero-based position in the source. Stable for the life of the batch.
    pub index: usize,
    pub text: String,
}

impl RawRow {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// A validated identifier ready for rendering.
///
/// `payload` is always exactly [`PAYLOAD_LEN`] ASCII digits and `tagged` is
/// that payload prefixed with [`AI_TAG`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalCode {
    index: usize,
    payload: String,
    tagged: String,
}

impl CanonicalCode {
    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn tagged(&self) -> &str {
        &self.tagged
    }
}

/// Validates every row of a batch.
///
/// Never stops at the first bad row. Returns all codes in source order, or a
/// [`ValidationError`] listing every violation.
///
/// # Errors
///
/// Returns a [`ValidationError`] if at least one row is empty or is not an
/// (optionally tagged) 18-digit payload.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(rows = rows.len())))]
pub fn validate(rows: &[RawRow]) -> Result<Vec<CanonicalCode>, ValidationError> {
    let mut codes = Vec::with_capacity(rows.len());
    let mut violations = Vec::new();

    for row in rows {
        match normalize(row) {
            Ok(code) => codes.push(code),
            Err(violation) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Row {} rejected ({}): {:?}",
                    violation.row_number(),
                    violation.reason,
                    row.text
                );
                violations.push(violation);
            }
        }
    }

    if violations.is_empty() {
        Ok(codes)
    } else {
        Err(ValidationError::new(violations))
    }
}

fn normalize(row: &RawRow) -> Result<CanonicalCode, Violation> {
    let compact: String = row.text.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.is_empty() {
        return Err(Violation {
            index: row.index,
            reason: ViolationReason::Empty,
        });
    }

    let payload = compact.strip_prefix(AI_TAG).unwrap_or(&compact);
    if payload.len() != PAYLOAD_LEN || !payload.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Violation {
            index: row.index,
            reason: ViolationReason::InvalidFormatOrLength,
        });
    }

    Ok(CanonicalCode {
        index: row.index,
        payload: payload.to_owned(),
        tagged: format!("{AI_TAG}{payload}"),
    })
}
