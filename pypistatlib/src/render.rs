//! Fixed-width pipe-table rendering.
//!
//! The table text is part of the CLI contract: downstream consumers diff and
//! parse it, so column widths, separator rows, and the trailing newline are
//! all load-bearing.

use crate::table::DownloadTable;

/// Insert thousands separators into a decimal count (`342250` → `342,250`).
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Render `table` as a pipe-delimited text table.
///
/// Counts in the last column gain thousands separators, the first column is
/// left-justified, every other column right-justified. In markdown mode the
/// separator row carries trailing colons so markdown renderers keep that
/// right alignment; the first (label) column stays left-aligned in both
/// modes.
pub fn tabulate(table: &DownloadTable, markdown: bool) -> String {
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            if let Some(cell) = row.last_mut() {
                if let Ok(count) = cell.parse::<u64>() {
                    *cell = format_count(count);
                }
            }
            row
        })
        .collect();

    let mut widths: Vec<usize> = table.header.iter().map(String::len).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &table.header, &widths, true);

    let separator: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            if i > 0 && markdown {
                format!("{}:", "-".repeat(width.saturating_sub(1)))
            } else {
                "-".repeat(width)
            }
        })
        .collect();
    push_line(&mut out, &separator, &widths, true);

    for row in &rows {
        push_line(&mut out, row, &widths, false);
    }

    out
}

/// Append one padded `| ... |` line. Header and separator cells are all
/// left-justified; data cells right-justify everything after the label.
fn push_line(out: &mut String, cells: &[String], widths: &[usize], left_align_all: bool) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &width))| {
            if left_align_all || i == 0 {
                format!("{:<width$}", cell, width = width)
            } else {
                format!("{:>width$}", cell, width = width)
            }
        })
        .collect();

    out.push_str("| ");
    out.push_str(&padded.join(" | "));
    out.push_str(" |\n");
}
