//! Tabular query results and derived-column enrichment.
//!
//! The data flow is:
//! 1. Raw JSON payload (see [`crate::result`])
//! 2. `DownloadTable` (header + display-ready string rows)
//! 3. Enrichment (percent column, Total row)
//! 4. Rendering (see [`crate::render`])

use serde::{Deserialize, Serialize};

use crate::error::PypistatError;
use crate::Result;

/// Header label for the column inserted by [`DownloadTable::add_percentages`].
const PERCENT_HEADER: &str = "percent";

/// Row label for the row appended by [`DownloadTable::add_download_total`].
const TOTAL_LABEL: &str = "Total";

/// A download-count query result, ready for enrichment and rendering.
///
/// Cells are display-ready strings in result order. The last column always
/// holds a decimal download count; the columns before it label the bucket the
/// count belongs to (python version, distro name, country code, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTable {
    /// Column names, in result order.
    pub header: Vec<String>,
    /// Data rows; every row has the same arity as `header`.
    pub rows: Vec<Vec<String>>,
}

impl DownloadTable {
    /// Create a table, checking that every row matches the header arity.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for row in &rows {
            if row.len() != header.len() {
                return Err(PypistatError::MalformedResult(format!(
                    "row has {} cells, expected {}",
                    row.len(),
                    header.len()
                )));
            }
        }
        Ok(Self { header, rows })
    }

    /// Parse the count column (last cell of each row) as integers.
    fn counts(&self) -> Result<Vec<u64>> {
        self.rows
            .iter()
            .map(|row| {
                let cell = row.last().map(String::as_str).unwrap_or_default();
                cell.parse::<u64>()
                    .map_err(|_| PypistatError::BadCount(cell.to_string()))
            })
            .collect()
    }

    /// Return a copy with a `percent` column inserted before the count column.
    ///
    /// Each share is `100 * count / total` rounded half-up to two decimals,
    /// so small non-zero counts show as `0.00%` rather than disappearing.
    /// Fails on non-numeric counts or a zero total.
    pub fn add_percentages(&self) -> Result<DownloadTable> {
        let counts = self.counts()?;
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return Err(PypistatError::EmptyTotal);
        }

        let mut header = self.header.clone();
        header.insert(header.len() - 1, PERCENT_HEADER.to_string());

        let rows = self
            .rows
            .iter()
            .zip(&counts)
            .map(|(row, &count)| {
                let mut row = row.clone();
                row.insert(row.len() - 1, format_percent(count, total));
                row
            })
            .collect();

        Ok(DownloadTable { header, rows })
    }

    /// Return a copy with a `Total` summary row appended.
    ///
    /// The label lands in the first column, the raw decimal sum in the count
    /// column, and every cell in between stays empty. Thousands separators
    /// are a render-time concern and are not applied here.
    pub fn add_download_total(&self) -> Result<DownloadTable> {
        let total: u64 = self.counts()?.iter().sum();

        let mut row = vec![String::new(); self.header.len()];
        if let Some(first) = row.first_mut() {
            *first = TOTAL_LABEL.to_string();
        }
        if let Some(last) = row.last_mut() {
            *last = total.to_string();
        }

        let mut rows = self.rows.clone();
        rows.push(row);

        Ok(DownloadTable {
            header: self.header.clone(),
            rows,
        })
    }
}

/// Format `100 * count / total` with exactly two decimal digits and a `%`.
fn format_percent(count: u64, total: u64) -> String {
    // Hundredths of a percent, rounded half-up on the exact rational.
    let hundredths = (count as u128 * 10_000 + total as u128 / 2) / total as u128;
    format!("{}.{:02}%", hundredths / 100, hundredths % 100)
}
