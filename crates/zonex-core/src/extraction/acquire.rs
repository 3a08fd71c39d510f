use crate::error::ZonexError;
use crate::extraction::{OcrEngine, Page};
use crate::geometry::{Coordinates, Region};
use serde::{Deserialize, Serialize};

/// Which tier produced a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// The PDF text layer.
    Native,
    /// OCR over the rendered region.
    Ocr,
    /// Neither tier found anything (or OCR was not available).
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredText {
    pub text: String,
    pub source: TextSource,
}

/// Resolve template coordinates and acquire the text inside them.
pub fn acquire_text_at(
    page: &Page<'_>,
    coordinates: &Coordinates,
    ocr: Option<&dyn OcrEngine>,
) -> Result<AcquiredText, ZonexError> {
    let region = coordinates.resolve()?;
    acquire_text(page, &region, ocr)
}

/// Best-effort text for `region`: the text layer first, OCR of the rendered
/// region only when the text layer has nothing.
///
/// Only leading and trailing whitespace is stripped; inner spacing is kept
/// for column splitting.
pub fn acquire_text(
    page: &Page<'_>,
    region: &Region,
    ocr: Option<&dyn OcrEngine>,
) -> Result<AcquiredText, ZonexError> {
    let native = page.text(region)?;
    let native = native.trim();
    if !native.is_empty() {
        log::debug!(
            "page {} region {}: {} chars from text layer",
            page.index(),
            region,
            native.len()
        );
        return Ok(AcquiredText {
            text: native.to_string(),
            source: TextSource::Native,
        });
    }

    let Some(engine) = ocr else {
        log::debug!(
            "page {} region {}: text layer empty, OCR disabled",
            page.index(),
            region
        );
        return Ok(empty());
    };

    let image = page.raster(region)?;
    let recognized = engine.recognize(&image)?;
    let recognized = recognized.trim();
    log::debug!(
        "page {} region {}: text layer empty, {} returned {} chars",
        page.index(),
        region,
        engine.engine_name(),
        recognized.len()
    );

    if recognized.is_empty() {
        return Ok(empty());
    }

    Ok(AcquiredText {
        text: recognized.to_string(),
        source: TextSource::Ocr,
    })
}

fn empty() -> AcquiredText {
    AcquiredText {
        text: String::new(),
        source: TextSource::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{PdfDocument, RasterImage, TextFragment};
    use std::cell::Cell;

    struct OnePage {
        text: &'static str,
        rasters: Cell<usize>,
    }

    impl PdfDocument for OnePage {
        fn page_count(&self) -> usize {
            1
        }

        fn text(&self, _page: usize, _region: &Region) -> Result<String, ZonexError> {
            Ok(self.text.to_string())
        }

        fn fragments(&self, _page: usize, _region: &Region) -> Result<Vec<TextFragment>, ZonexError> {
            Ok(vec![])
        }

        fn raster(&self, _page: usize, _region: &Region) -> Result<RasterImage, ZonexError> {
            self.rasters.set(self.rasters.get() + 1);
            Ok(RasterImage {
                width: 1,
                height: 1,
                png: vec![],
            })
        }
    }

    struct FixedOcr(&'static str, Cell<usize>);

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _image: &RasterImage) -> Result<String, ZonexError> {
            self.1.set(self.1.get() + 1);
            Ok(self.0.to_string())
        }

        fn engine_name(&self) -> &str {
            "fixed"
        }
    }

    fn doc(text: &'static str) -> Box<dyn PdfDocument> {
        Box::new(OnePage {
            text,
            rasters: Cell::new(0),
        })
    }

    fn region() -> Region {
        Region::new(0.0, 0.0, 100.0, 20.0)
    }

    #[test]
    fn test_native_text_skips_ocr() {
        let d = doc("\n  Item1   10.50   2  \n");
        let ocr = FixedOcr("should not be used", Cell::new(0));
        let got = acquire_text(&d.page(0).unwrap(), &region(), Some(&ocr)).unwrap();
        assert_eq!(got.text, "Item1   10.50   2");
        assert_eq!(got.source, TextSource::Native);
        assert_eq!(ocr.1.get(), 0);
    }

    #[test]
    fn test_blank_text_layer_falls_back_to_ocr() {
        let d = doc("  \n\t ");
        let ocr = FixedOcr("  scanned total 42 \n", Cell::new(0));
        let got = acquire_text(&d.page(0).unwrap(), &region(), Some(&ocr)).unwrap();
        assert_eq!(got.text, "scanned total 42");
        assert_eq!(got.source, TextSource::Ocr);
        assert_eq!(ocr.1.get(), 1);
    }

    #[test]
    fn test_empty_ocr_is_not_an_error() {
        let d = doc("");
        let ocr = FixedOcr("   ", Cell::new(0));
        let got = acquire_text(&d.page(0).unwrap(), &region(), Some(&ocr)).unwrap();
        assert_eq!(got.text, "");
        assert_eq!(got.source, TextSource::Empty);
    }

    #[test]
    fn test_without_ocr_engine() {
        let d = doc("");
        let got = acquire_text(&d.page(0).unwrap(), &region(), None).unwrap();
        assert_eq!(got.source, TextSource::Empty);
    }

    #[test]
    fn test_invalid_coordinates() {
        let d = doc("text");
        let coords: Coordinates = serde_json::from_str(r#"[1, 2, "x", 4]"#).unwrap();
        let err = acquire_text_at(&d.page(0).unwrap(), &coords, None).unwrap_err();
        assert!(matches!(err, ZonexError::InvalidRegion { .. }));
    }
}
