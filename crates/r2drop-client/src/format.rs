//! Human-readable rendering of listings.

use std::fmt::Write as _;

use r2drop_core::ObjectEntry;

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count with base-1024 units, trimming trailing zeros.
///
/// # Examples
///
/// ```
/// use r2drop_client::format_bytes;
///
/// assert_eq!(format_bytes(0, 2), "0 Bytes");
/// assert_eq!(format_bytes(1536, 2), "1.5 KB");
/// assert_eq!(format_bytes(1_048_576, 2), "1 MB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    if bytes == 0 {
        return "0 Bytes".to_owned();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut number = format!("{value:.decimals$}");
    if number.contains('.') {
        let trimmed = number.trim_end_matches('0').trim_end_matches('.').len();
        number.truncate(trimmed);
    }
    format!("{number} {}", UNITS[unit])
}

/// Render a listing as a plain-text table.
///
/// Columns are key, size, and upload time (UTC). An empty listing renders as
/// a single line.
#[must_use]
pub fn render_table(entries: &[ObjectEntry]) -> String {
    if entries.is_empty() {
        return "No files found\n".to_owned();
    }

    let rows: Vec<[String; 3]> = entries
        .iter()
        .map(|e| {
            [
                e.key.clone(),
                format_bytes(e.size, 2),
                e.uploaded.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            ]
        })
        .collect();

    let header = ["KEY", "SIZE", "UPLOADED"];
    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(&mut out, &rule, &widths);
    for row in &rows {
        write_row(&mut out, row, &widths);
    }
    out
}

fn write_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize; 3]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}
