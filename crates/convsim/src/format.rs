//! Plain-text formatting for analyzer output

use std::fmt::Write as _;

use convsim_core::analysis::Cell;

/// Fixed-precision float, `n/a` for missing or NaN values
pub fn format_float(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) if !v.is_nan() => format!("{v:.digits$}"),
        _ => "n/a".to_string(),
    }
}

/// Format a cell for a table: floats at `digits` precision, nulls as `n/a`
pub fn format_cell(cell: &Cell, digits: usize) -> String {
    match cell {
        Cell::Null => "n/a".to_string(),
        Cell::Float(v) => format_float(Some(*v), digits),
        other => other.to_string(),
    }
}

/// Format a ratio in `[0, 1]` as a percentage
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Format seconds as `1.2s`, `850ms` or `3m 05s`
pub fn format_duration(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else {
        let total = seconds.round() as u64;
        format!("{}m {:02}s", total / 60, total % 60)
    }
}

/// Left-aligned text table with a header rule
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render the table; an empty table renders as `(no data)`
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return "(no data)\n".to_string();
        }
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, value) in row.iter().enumerate() {
                widths[i] = widths[i].max(value.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, values: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let value = values.get(i).map(String::as_str).unwrap_or("");
        let _ = write!(line, "{value:<width$}");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
