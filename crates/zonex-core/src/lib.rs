pub mod config;
pub mod error;
pub mod export;
pub mod extraction;
pub mod field;
pub mod geometry;
pub mod pipeline;
pub mod table;
pub mod template;

use config::ExtractOptions;
use error::ZonexError;
use extraction::acquire::{acquire_text, AcquiredText};
use extraction::{OcrEngine, PdfProvider};
use geometry::Region;
use pipeline::{BatchResult, Extractor};
use std::path::Path;
use template::schema::{ColumnDefinition, Template};

/// Main API entry point: run `template` over every PDF in `paths`.
///
/// Documents are processed in order. A document that cannot be processed
/// becomes a warning in the result; it never aborts the batch.
pub fn extract_batch<P: AsRef<Path>>(
    template: &Template,
    paths: &[P],
    provider: &dyn PdfProvider,
    ocr: Option<&dyn OcrEngine>,
    options: &ExtractOptions,
) -> BatchResult {
    Extractor::new(template, provider)
        .with_ocr(ocr)
        .with_options(options.clone())
        .run_batch(paths)
}

/// Acquire the text of one region, reporting which tier produced it.
pub fn preview_region(
    path: &Path,
    page: usize,
    region: &Region,
    provider: &dyn PdfProvider,
    ocr: Option<&dyn OcrEngine>,
) -> Result<AcquiredText, ZonexError> {
    let doc = provider.open(path)?;
    let page = doc.page(page)?;
    acquire_text(&page, region, ocr)
}

/// Guess spatial columns for a table region from its positioned text.
pub fn suggest_columns(
    path: &Path,
    page: usize,
    region: &Region,
    tolerance: f64,
    provider: &dyn PdfProvider,
) -> Result<Vec<ColumnDefinition>, ZonexError> {
    let doc = provider.open(path)?;
    let page = doc.page(page)?;
    let fragments = page.fragments(region)?;
    Ok(table::detect_columns(&fragments, tolerance))
}
