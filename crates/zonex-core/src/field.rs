use crate::error::ZonexError;
use crate::extraction::acquire::acquire_text;
use crate::extraction::{OcrEngine, Page};
use crate::geometry::Region;
use crate::template::schema::{FieldDefinition, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The value of one field: a scalar, or the rows of a repeating field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(s) => s.is_empty(),
            FieldValue::Multiple(v) => v.is_empty(),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Single(String::new())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Single(s) => write!(f, "{s}"),
            FieldValue::Multiple(v) => write!(f, "{}", v.join("; ")),
        }
    }
}

/// Extract one field from its page.
pub fn extract_field(
    page: &Page<'_>,
    field: &FieldDefinition,
    ocr: Option<&dyn OcrEngine>,
) -> Result<FieldValue, ZonexError> {
    let region = field.coordinates.resolve()?;

    if !field.multiple {
        let acquired = acquire_text(page, &region, ocr)?;
        return Ok(FieldValue::Single(clean_value(&acquired.text, field.value_type)));
    }

    let mut rows = Vec::new();
    for row in row_regions(field, &region)? {
        let acquired = acquire_text(page, &row, ocr)?;
        if !acquired.text.is_empty() {
            rows.push(clean_value(&acquired.text, field.value_type));
        }
    }
    Ok(FieldValue::Multiple(rows))
}

const ROW_EPSILON: f64 = 1e-9;

/// Upper bound on the rows one repeating field may scan.
pub const MAX_ROWS: usize = 10_000;

/// The row bands scanned by a repeating field.
///
/// Rows keep the field's x-range and start at `start_y` (default 0),
/// `row_height` tall, advancing by `row_spacing` (default `row_height`).
/// Scanning stops at the first row that would extend past `end_y`.
pub fn row_regions(field: &FieldDefinition, base: &Region) -> Result<Vec<Region>, ZonexError> {
    let config_error = |reason: &str| ZonexError::Configuration {
        field: field.name.clone(),
        reason: reason.to_string(),
    };

    let start_y = field.setting("start_y", field.start_y.as_ref())?.unwrap_or(0.0);
    let end_y = field.setting("end_y", field.end_y.as_ref())?;
    let row_height = field.setting("row_height", field.row_height.as_ref())?;
    let (end_y, row_height) = match (end_y, row_height) {
        (Some(end_y), Some(row_height)) => (end_y, row_height),
        _ => {
            return Err(config_error(
                "repeating fields require 'end_y' and 'row_height'",
            ))
        }
    };
    if !(row_height > 0.0) {
        return Err(config_error("'row_height' must be greater than 0"));
    }

    let row_spacing = field
        .setting("row_spacing", field.row_spacing.as_ref())?
        .unwrap_or(row_height);
    if !(row_spacing > 0.0) {
        return Err(config_error("'row_spacing' must be greater than 0"));
    }

    let mut rows = Vec::new();
    let mut current_y = start_y;
    while current_y < end_y && current_y + row_height <= end_y + ROW_EPSILON {
        if rows.len() == MAX_ROWS {
            return Err(config_error(&format!(
                "more than {MAX_ROWS} rows between 'start_y' and 'end_y'"
            )));
        }
        let next_y = current_y + row_spacing;
        if next_y == current_y {
            return Err(config_error("'row_spacing' is too small to advance past 'start_y'"));
        }
        rows.push(Region::new(base.x0, current_y, base.x1, current_y + row_height));
        current_y = next_y;
    }
    Ok(rows)
}

/// Normalize raw region text for a field of the given type.
///
/// Newlines become spaces and the result is trimmed. Currency values then
/// keep only digits and `,`/`.` separators.
pub fn clean_value(text: &str, value_type: ValueType) -> String {
    let text = text.replace("\r\n", " ").replace('\n', " ");
    let text = text.trim();
    match value_type {
        ValueType::Currency => clean_currency(text),
        ValueType::Date => clean_date(text),
        ValueType::Generic => text.to_string(),
    }
}

fn clean_currency(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect()
}

// Dates are passed through as printed. Normalizing to a fixed format would
// go here once a target format is settled.
fn clean_date(text: &str) -> String {
    text.to_string()
}
