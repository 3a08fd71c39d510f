pub mod columns;
pub mod export;
pub mod extract;
pub mod preview;
pub mod template;

use std::path::PathBuf;
use zonex_core::config::OcrConfig;
use zonex_core::extraction::tesseract::TesseractEngine;

/// Resolve the OCR engine for a command. Returns `None` when OCR is switched
/// off or tesseract cannot be found.
pub fn ocr_engine(no_ocr: bool, tesseract: Option<PathBuf>) -> Option<TesseractEngine> {
    if no_ocr {
        log::info!("OCR fallback disabled");
        return None;
    }
    match OcrConfig::resolve(tesseract) {
        Some(config) => {
            log::info!("using tesseract at {}", config.executable.display());
            Some(TesseractEngine::new(config))
        }
        None => {
            log::warn!("tesseract not found; regions without a text layer will come back empty");
            None
        }
    }
}
