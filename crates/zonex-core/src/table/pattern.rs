use crate::error::ZonexError;
use crate::table::Row;
use crate::template::schema::ColumnDefinition;
use regex::Regex;

/// Pull each column's value out of every line with that column's regex.
///
/// The first match in the line (trimmed) becomes the cell. Columns without
/// a pattern, or whose pattern does not match, get an empty string. Lines
/// where nothing matched are skipped.
pub fn segment(text: &str, columns: &[ColumnDefinition]) -> Result<Vec<Row>, ZonexError> {
    let compiled = columns
        .iter()
        .map(|col| col.pattern.as_deref().map(Regex::new).transpose())
        .collect::<Result<Vec<Option<Regex>>, regex::Error>>()?;

    let mut rows = Vec::new();
    for line in text.lines() {
        let row: Row = columns
            .iter()
            .zip(&compiled)
            .map(|(col, re)| {
                let cell = re
                    .as_ref()
                    .and_then(|re| re.find(line))
                    .map(|m| m.as_str().trim())
                    .unwrap_or_default();
                (col.name.clone(), cell.to_string())
            })
            .collect();

        if row.values().any(|cell| !cell.is_empty()) {
            rows.push(row);
        }
    }

    log::debug!(
        "pattern segmentation: {} rows from {} lines",
        rows.len(),
        text.lines().count()
    );

    Ok(rows)
}
