use std::path::{Path, PathBuf};
use zonex_core::error::ZonexError;
use zonex_core::extraction::acquire::TextSource;
use zonex_core::extraction::poppler::PopplerProvider;
use zonex_core::extraction::OcrEngine;
use zonex_core::geometry::Region;

pub fn run(
    pdf: &Path,
    page: usize,
    region: &Region,
    no_ocr: bool,
    tesseract: Option<PathBuf>,
) -> Result<(), ZonexError> {
    let provider = PopplerProvider::new();
    let engine = super::ocr_engine(no_ocr, tesseract);

    let acquired = zonex_core::preview_region(
        pdf,
        page,
        region,
        &provider,
        engine.as_ref().map(|e| e as &dyn OcrEngine),
    )?;

    let source = match acquired.source {
        TextSource::Native => "text layer",
        TextSource::Ocr => "OCR",
        TextSource::Empty => "nothing found",
    };
    eprintln!("Page {page}, region {region}: {source}");
    println!("{}", acquired.text);
    Ok(())
}
