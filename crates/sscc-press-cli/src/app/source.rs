use calamine::{Data, Range, Reader, open_workbook_auto};
use sscc_press::{Error, RawRow, Result, RowSource};
use std::path::PathBuf;

/// Largest integer an `f64` cell holds exactly.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Reads the first column of the first sheet of a workbook (`xlsx`, `xls`,
/// `xlsb` or `ods`). There is no header row.
#[derive(Clone, Debug)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for WorkbookSource {
    fn read_rows(&mut self) -> Result<Vec<RawRow>> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| Error::Spreadsheet {
            context: format!("Failed to open {}: {e}", self.path.display()),
        })?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::Spreadsheet {
                context: format!("{} has no sheets", self.path.display()),
            })?
            .map_err(|e| Error::Spreadsheet {
                context: format!("Failed to read first sheet of {}: {e}", self.path.display()),
            })?;

        let rows = rows_from_range(&range);
        tracing::debug!("Read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

/// First column of the used range, one row per sheet row.
///
/// Row indices are absolute sheet rows, so blank rows above the used range
/// still count when a row number is reported.
pub fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let Some((first_row, _)) = range.start() else {
        return Vec::new();
    };

    range
        .rows()
        .enumerate()
        .map(|(i, cells)| {
            let text = cells.first().map(cell_text).unwrap_or_default();
            RawRow::new(first_row as usize + i, text)
        })
        .collect()
}

/// Text of a cell as a user would read it.
///
/// Whole-number floats print without a fraction or exponent as long as the
/// float holds them exactly. Larger ones print in scientific notation, so a
/// rounded identifier is rejected instead of silently changed.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT => format!("{f:.0}"),
        Data::Float(f) if f.fract() == 0.0 => {
            tracing::warn!("Numeric cell {f:e} exceeds float precision; store identifiers as text");
            format!("{f:e}")
        }
        Data::Float(f) => f.to_string(),
        other => other.to_string(),
    }
}
