pub mod acquire;
pub mod poppler;
pub mod tesseract;

use crate::error::ZonexError;
use crate::geometry::Region;
use std::path::Path;

/// A positioned run of text on a page.
///
/// Coordinates are PDF user space: origin bottom-left, larger `y` is
/// visually higher.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        TextFragment {
            text: text.into(),
            x0,
            y0,
            x1,
            y1,
        }
    }
}

/// A rendered page region, PNG encoded.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Opens PDF documents.
pub trait PdfProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, ZonexError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// An open PDF document. Resources held by the handle are released on drop.
///
/// Page indices are zero-based. Implementations may assume the index has
/// been range-checked; go through [`PdfDocument::page`] to get that.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Native text-layer content clipped to `region`, with layout spacing.
    fn text(&self, page: usize, region: &Region) -> Result<String, ZonexError>;

    /// Text fragments lying entirely inside `region`.
    fn fragments(&self, page: usize, region: &Region) -> Result<Vec<TextFragment>, ZonexError>;

    /// Render `region` to an image at the document's native resolution.
    fn raster(&self, page: usize, region: &Region) -> Result<RasterImage, ZonexError>;
}

impl dyn PdfDocument + '_ {
    /// Borrow a single page, checking the index against the page count.
    pub fn page(&self, index: usize) -> Result<Page<'_>, ZonexError> {
        let page_count = self.page_count();
        if index >= page_count {
            return Err(ZonexError::PageOutOfRange {
                page: index,
                page_count,
            });
        }
        Ok(Page { doc: self, index })
    }
}

/// A range-checked view of one page of an open document.
#[derive(Clone, Copy)]
pub struct Page<'a> {
    doc: &'a dyn PdfDocument,
    index: usize,
}

impl Page<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self, region: &Region) -> Result<String, ZonexError> {
        self.doc.text(self.index, region)
    }

    pub fn fragments(&self, region: &Region) -> Result<Vec<TextFragment>, ZonexError> {
        self.doc.fragments(self.index, region)
    }

    pub fn raster(&self, region: &Region) -> Result<RasterImage, ZonexError> {
        self.doc.raster(self.index, region)
    }
}

/// Optical character recognition over a rendered region.
pub trait OcrEngine {
    fn recognize(&self, image: &RasterImage) -> Result<String, ZonexError>;

    /// Name of this engine (for diagnostics).
    fn engine_name(&self) -> &str;
}
