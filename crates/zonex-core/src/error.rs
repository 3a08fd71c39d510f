use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ZonexError {
    #[error("invalid region {input}: {reason}")]
    InvalidRegion { input: String, reason: String },

    #[error("invalid configuration for '{field}': {reason}")]
    Configuration { field: String, reason: String },

    #[error("failed to load template from {path}: {reason}")]
    TemplateLoad { path: PathBuf, reason: String },

    #[error("failed to save template to {path}: {reason}")]
    TemplateSave { path: PathBuf, reason: String },

    #[error("invalid template: {0}")]
    TemplateInvalid(String),

    #[error("duplicate {kind} name '{name}' in template")]
    DuplicateName { kind: &'static str, name: String },

    #[error("failed to open PDF {path}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("page index {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("{tool} not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PopplerNotFound { tool: String },

    #[error("{tool} failed with exit code {code}: {stderr}")]
    PopplerFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("tesseract not found at {0}. Install tesseract-ocr or set TESSERACT_PATH")]
    TesseractNotFound(PathBuf),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("invalid column pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("failed to export to {path}: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ZonexError {
    /// Whether this error invalidates the whole document rather than a
    /// single field or table.
    ///
    /// The pipeline aborts the current document on these and carries on
    /// with the next one; everything else is recorded against the field or
    /// table that raised it.
    pub fn is_document_fatal(&self) -> bool {
        matches!(
            self,
            ZonexError::DocumentOpen { .. }
                | ZonexError::PageOutOfRange { .. }
                | ZonexError::PopplerNotFound { .. }
                | ZonexError::Io(_)
        )
    }
}
