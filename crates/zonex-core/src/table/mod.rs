pub mod columns;
pub mod pattern;
pub mod spatial;
pub mod width;

use crate::config::ExtractOptions;
use crate::error::ZonexError;
use crate::extraction::acquire::acquire_text;
use crate::extraction::{OcrEngine, Page, TextFragment};
use crate::template::schema::{ColumnDefinition, SegmentMode, TableDefinition};
use indexmap::IndexMap;

pub use columns::detect_columns;

/// One table row: column name to cell text, in column-definition order.
pub type Row = IndexMap<String, String>;

/// What a table region yielded, ready for segmentation.
pub enum TableInput<'a> {
    /// Layout-preserving text, one table row per line.
    Text(&'a str),
    /// Positioned text fragments.
    Fragments(&'a [TextFragment]),
}

/// Partition table content into rows keyed by column name.
///
/// Text input is segmented by pattern when any column has a pattern, by
/// whitespace runs otherwise. Fragment input is segmented spatially.
pub fn segment_table(
    input: TableInput<'_>,
    columns: &[ColumnDefinition],
    row_tolerance: f64,
) -> Result<Vec<Row>, ZonexError> {
    match input {
        TableInput::Fragments(fragments) => spatial::segment(fragments, columns, row_tolerance),
        TableInput::Text(text) => match SegmentMode::for_columns(columns) {
            SegmentMode::Pattern => pattern::segment(text, columns),
            _ => Ok(width::segment(text, columns)),
        },
    }
}

/// Extract and segment one table from its page.
///
/// Spatial tables read positioned fragments from the text layer; the other
/// modes segment the region's acquired text, which may come from OCR.
pub fn extract_table(
    page: &Page<'_>,
    table: &TableDefinition,
    ocr: Option<&dyn OcrEngine>,
    options: &ExtractOptions,
) -> Result<Vec<Row>, ZonexError> {
    let region = table.coordinates.resolve()?;
    let mode = table.mode();

    let rows = if mode == SegmentMode::Spatial {
        let fragments = page.fragments(&region)?;
        segment_table(
            TableInput::Fragments(&fragments),
            &table.columns,
            options.row_tolerance,
        )?
    } else {
        let acquired = acquire_text(page, &region, ocr)?;
        segment_table(
            TableInput::Text(&acquired.text),
            &table.columns,
            options.row_tolerance,
        )?
    };

    log::debug!(
        "table '{}' ({:?}) on page {}: {} rows",
        table.name,
        mode,
        page.index(),
        rows.len()
    );
    Ok(rows)
}
