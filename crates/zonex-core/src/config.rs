use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the tesseract executable.
pub const TESSERACT_PATH_ENV: &str = "TESSERACT_PATH";
/// Environment variable naming tesseract's language data directory.
pub const TESSDATA_PREFIX_ENV: &str = "TESSDATA_PREFIX";

const WELL_KNOWN_TESSERACT: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

/// Knobs for the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Vertical bucket size when grouping positioned fragments into rows.
    pub row_tolerance: f64,
    /// Attempt OCR when a region has no text layer.
    pub ocr_fallback: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            row_tolerance: 5.0,
            ocr_fallback: true,
        }
    }
}

/// Poppler tool locations and raster resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopplerConfig {
    pub pdftotext: PathBuf,
    pub pdftoppm: PathBuf,
    pub pdfinfo: PathBuf,
    /// 72 dpi renders one pixel per page point.
    pub render_dpi: u32,
}

impl Default for PopplerConfig {
    fn default() -> Self {
        PopplerConfig {
            pdftotext: PathBuf::from("pdftotext"),
            pdftoppm: PathBuf::from("pdftoppm"),
            pdfinfo: PathBuf::from("pdfinfo"),
            render_dpi: 72,
        }
    }
}

/// Where tesseract lives and how to call it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub executable: PathBuf,
    pub language: String,
    pub page_segmentation_mode: u8,
    /// Passed to tesseract as `TESSDATA_PREFIX` when set.
    pub tessdata: Option<PathBuf>,
}

impl OcrConfig {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        OcrConfig {
            executable: executable.into(),
            language: "eng".into(),
            page_segmentation_mode: 3,
            tessdata: None,
        }
    }

    /// Locate tesseract from the process environment.
    ///
    /// See [`OcrConfig::resolve_with`] for the search order.
    pub fn resolve(explicit: Option<PathBuf>) -> Option<OcrConfig> {
        Self::resolve_with(explicit, |key| std::env::var_os(key).map(PathBuf::from))
    }

    /// Locate tesseract: `explicit`, then `TESSERACT_PATH` (if the file
    /// exists), then every directory on `PATH`, then well-known install
    /// locations. Returns `None` when nothing is found.
    pub fn resolve_with(
        explicit: Option<PathBuf>,
        env: impl Fn(&str) -> Option<PathBuf>,
    ) -> Option<OcrConfig> {
        let from_env = env(TESSERACT_PATH_ENV).filter(|p| p.is_file());
        let from_path = || {
            env("PATH").and_then(|paths| {
                std::env::split_paths(&paths)
                    .flat_map(|dir| [dir.join("tesseract"), dir.join("tesseract.exe")])
                    .find(|candidate| candidate.is_file())
            })
        };
        let well_known = || {
            WELL_KNOWN_TESSERACT
                .iter()
                .map(PathBuf::from)
                .find(|p| p.is_file())
        };

        let executable = explicit
            .or(from_env)
            .or_else(from_path)
            .or_else(well_known)?;

        let tessdata = match env(TESSDATA_PREFIX_ENV) {
            Some(_) => None,
            None => sibling_tessdata(&executable),
        };

        Some(OcrConfig {
            tessdata,
            ..OcrConfig::new(executable)
        })
    }
}

fn sibling_tessdata(executable: &Path) -> Option<PathBuf> {
    let dir = executable.parent()?.join("tessdata");
    if dir.is_dir() {
        Some(dir)
    } else {
        log::warn!("no tessdata folder next to {}", executable.display());
        None
    }
}
