use crate::config::{OcrConfig, TESSDATA_PREFIX_ENV};
use crate::error::ZonexError;
use crate::extraction::{OcrEngine, RasterImage};
use std::io::Write;
use std::process::Command;

/// OCR backend running the `tesseract` executable.
pub struct TesseractEngine {
    config: OcrConfig,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        TesseractEngine { config }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.executable);
        if let Some(ref tessdata) = self.config.tessdata {
            cmd.env(TESSDATA_PREFIX_ENV, tessdata);
        }
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &RasterImage) -> Result<String, ZonexError> {
        let mut tmpfile = tempfile::Builder::new()
            .prefix("zonex-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ZonexError::OcrFailed(e.to_string()))?;
        tmpfile
            .write_all(&image.png)
            .map_err(|e| ZonexError::OcrFailed(e.to_string()))?;

        let psm = self.config.page_segmentation_mode.to_string();
        let output = self
            .command()
            .arg(tmpfile.path())
            .arg("stdout")
            .args(["-l", self.config.language.as_str()])
            .args(["--psm", psm.as_str()])
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ZonexError::TesseractNotFound(self.config.executable.clone())
                } else {
                    ZonexError::OcrFailed(format!("tesseract failed: {e}"))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ZonexError::OcrFailed(format!(
                "tesseract exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn engine_name(&self) -> &str {
        "tesseract"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable() {
        let engine = TesseractEngine::new(OcrConfig::new("/nonexistent/bin/tesseract"));
        let image = RasterImage {
            width: 1,
            height: 1,
            png: vec![],
        };
        assert!(matches!(
            engine.recognize(&image),
            Err(ZonexError::TesseractNotFound(_))
        ));
    }
}
