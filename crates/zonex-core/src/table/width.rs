use crate::table::Row;
use crate::template::schema::ColumnDefinition;
use regex::Regex;
use std::sync::LazyLock;

static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid column gap regex"));

/// Split layout text into rows by runs of two or more whitespace characters.
///
/// Segments map to columns by position. Extra segments are dropped, missing
/// ones become empty strings, and rows with no non-blank cell are skipped.
pub fn segment(text: &str, columns: &[ColumnDefinition]) -> Vec<Row> {
    let mut rows = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells: Vec<&str> = COLUMN_GAP.split(line).collect();
        let row: Row = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let cell = cells.get(i).map(|c| c.trim()).unwrap_or_default();
                (col.name.clone(), cell.to_string())
            })
            .collect();

        if row.values().any(|cell| !cell.is_empty()) {
            rows.push(row);
        }
    }

    rows
}
