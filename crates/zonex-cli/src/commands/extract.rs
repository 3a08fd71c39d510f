use std::path::{Path, PathBuf};
use zonex_core::config::ExtractOptions;
use zonex_core::error::ZonexError;
use zonex_core::export::{default_base_name, export_batch, save_batch_json};
use zonex_core::extraction::poppler::PopplerProvider;
use zonex_core::extraction::OcrEngine;
use zonex_core::template::load_template;

use crate::output;

/// Returns `Ok(false)` when no document produced any record.
#[allow(clippy::too_many_arguments)]
pub fn run(
    template_file: &Path,
    pdfs: &[PathBuf],
    output_dir: &Path,
    name: Option<String>,
    json_file: Option<PathBuf>,
    no_ocr: bool,
    tesseract: Option<PathBuf>,
    row_tolerance: f64,
) -> Result<bool, ZonexError> {
    let template = load_template(template_file)?;

    let provider = PopplerProvider::new();
    provider.check_available()?;

    let engine = super::ocr_engine(no_ocr, tesseract);
    let options = ExtractOptions {
        row_tolerance,
        ocr_fallback: engine.is_some(),
    };

    let batch = zonex_core::extract_batch(
        &template,
        pdfs,
        &provider,
        engine.as_ref().map(|e| e as &dyn OcrEngine),
        &options,
    );

    if let Some(path) = json_file {
        save_batch_json(&path, &batch)?;
        eprintln!("Batch result written to {}", path.display());
    }

    let base = name.unwrap_or_else(default_base_name);
    let paths = export_batch(&batch, output_dir, &base)?;

    output::table::print_batch_summary(&batch, pdfs.len());
    eprintln!("Fields written to {}", paths.fields.display());
    eprintln!("Tables written to {}", paths.tables.display());

    Ok(!batch.is_empty())
}
