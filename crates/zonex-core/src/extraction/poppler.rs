use crate::config::PopplerConfig;
use crate::error::ZonexError;
use crate::extraction::{PdfDocument, PdfProvider, RasterImage, TextFragment};
use crate::geometry::Region;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::Command;

/// PDF backend built on the poppler command-line tools.
///
/// - `pdfinfo` validates the file and reads the page count on open
/// - `pdftotext -layout` with a crop box for clipped text
/// - `pdftotext -bbox` for positioned words
/// - `pdftoppm` with a crop box for rasters
pub struct PopplerProvider {
    config: PopplerConfig,
}

impl PopplerProvider {
    pub fn new() -> Self {
        Self::with_config(PopplerConfig::default())
    }

    pub fn with_config(config: PopplerConfig) -> Self {
        PopplerProvider { config }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.pdftotext)
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }

    /// Like [`is_available`](Self::is_available), but reports the missing
    /// tool by name.
    pub fn check_available(&self) -> Result<(), ZonexError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ZonexError::PopplerNotFound {
                tool: tool_name(&self.config.pdftotext),
            })
        }
    }
}

impl Default for PopplerProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProvider for PopplerProvider {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, ZonexError> {
        let info = run_tool(&self.config.pdfinfo, |cmd| {
            cmd.arg(path);
        })
        .map_err(|e| match e {
            ZonexError::PopplerFailed { stderr, .. } => ZonexError::DocumentOpen {
                path: path.to_path_buf(),
                reason: stderr.trim().to_string(),
            },
            other => other,
        })?;

        let info = String::from_utf8_lossy(&info);
        let page_count = parse_page_count(&info).ok_or_else(|| ZonexError::DocumentOpen {
            path: path.to_path_buf(),
            reason: "pdfinfo reported no page count".into(),
        })?;

        let scratch = tempfile::tempdir()?;
        log::debug!("opened {} ({} pages)", path.display(), page_count);

        Ok(Box::new(PopplerDocument {
            path: path.to_path_buf(),
            page_count,
            config: self.config.clone(),
            scratch,
            renders: Cell::new(0),
        }))
    }

    fn backend_name(&self) -> &str {
        "poppler"
    }
}

/// An open document. The scratch directory for rasters is deleted when the
/// handle is dropped.
struct PopplerDocument {
    path: PathBuf,
    page_count: usize,
    config: PopplerConfig,
    scratch: tempfile::TempDir,
    renders: Cell<usize>,
}

impl PdfDocument for PopplerDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn text(&self, page: usize, region: &Region) -> Result<String, ZonexError> {
        let page_arg = (page + 1).to_string();
        let crop = CropBox::new(region, 72);
        let stdout = run_tool(&self.config.pdftotext, |cmd| {
            cmd.args(["-f", page_arg.as_str(), "-l", page_arg.as_str(), "-layout", "-enc", "UTF-8"])
                .args(crop.args())
                .arg(&self.path)
                .arg("-");
        })?;
        Ok(String::from_utf8_lossy(&stdout)
            .trim_end_matches('\x0c')
            .to_string())
    }

    fn fragments(&self, page: usize, region: &Region) -> Result<Vec<TextFragment>, ZonexError> {
        let page_arg = (page + 1).to_string();
        let stdout = run_tool(&self.config.pdftotext, |cmd| {
            cmd.args(["-f", page_arg.as_str(), "-l", page_arg.as_str(), "-bbox", "-enc", "UTF-8"])
                .arg(&self.path)
                .arg("-");
        })?;
        let xml = String::from_utf8_lossy(&stdout);
        let pages = parse_bbox_xml(&xml)?;
        let Some(bbox_page) = pages.into_iter().next() else {
            return Ok(Vec::new());
        };
        Ok(bbox_page.fragments_in(region))
    }

    fn raster(&self, page: usize, region: &Region) -> Result<RasterImage, ZonexError> {
        let page_arg = (page + 1).to_string();
        let dpi = self.config.render_dpi;
        let dpi_arg = dpi.to_string();
        let crop = CropBox::new(region, dpi);

        let n = self.renders.get();
        self.renders.set(n + 1);
        let prefix = self.scratch.path().join(format!("region-{n}"));

        run_tool(&self.config.pdftoppm, |cmd| {
            cmd.args(["-f", page_arg.as_str(), "-l", page_arg.as_str(), "-r", dpi_arg.as_str()])
                .args(crop.args())
                .args(["-png", "-singlefile"])
                .arg(&self.path)
                .arg(&prefix);
        })?;

        let png_path = prefix.with_extension("png");
        let png = read_render(&self.config.pdftoppm, &png_path)?;
        let _ = std::fs::remove_file(&png_path);

        let (width, height) = png_dimensions(&png).unwrap_or((crop.width, crop.height));
        Ok(RasterImage { width, height, png })
    }
}

/// Integer pixel crop box for poppler's `-x -y -W -H` options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropBox {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl CropBox {
    /// Scale a page-point region to pixels at `dpi`, growing outward to whole
    /// pixels.
    fn new(region: &Region, dpi: u32) -> Self {
        let scale = f64::from(dpi) / 72.0;
        let x0 = (region.x0 * scale).floor().max(0.0);
        let y0 = (region.y0 * scale).floor().max(0.0);
        let x1 = (region.x1 * scale).ceil().max(x0 + 1.0);
        let y1 = (region.y1 * scale).ceil().max(y0 + 1.0);
        CropBox {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        }
    }

    fn args(&self) -> [String; 8] {
        [
            "-x".into(),
            self.x.to_string(),
            "-y".into(),
            self.y.to_string(),
            "-W".into(),
            self.width.to_string(),
            "-H".into(),
            self.height.to_string(),
        ]
    }
}

/// Read the PNG a successful pdftoppm run should have left behind.
fn read_render(tool: &Path, png_path: &Path) -> Result<Vec<u8>, ZonexError> {
    std::fs::read(png_path).map_err(|e| ZonexError::PopplerFailed {
        tool: tool_name(tool),
        code: 0,
        stderr: format!("no image written to {}: {e}", png_path.display()),
    })
}

fn tool_name(tool: &Path) -> String {
    tool.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| tool.display().to_string())
}

fn run_tool(tool: &Path, configure: impl FnOnce(&mut Command)) -> Result<Vec<u8>, ZonexError> {
    let name = tool_name(tool);

    let mut cmd = Command::new(tool);
    configure(&mut cmd);
    let output = cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ZonexError::PopplerNotFound { tool: name.clone() }
        } else {
            ZonexError::PopplerFailed {
                tool: name.clone(),
                code: -1,
                stderr: e.to_string(),
            }
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(ZonexError::PopplerFailed {
            tool: name,
            code,
            stderr,
        });
    }

    Ok(output.stdout)
}

fn parse_page_count(pdfinfo: &str) -> Option<usize> {
    pdfinfo
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

/// Width and height from a PNG IHDR chunk.
fn png_dimensions(png: &[u8]) -> Option<(u32, u32)> {
    const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
    if png.len() < 24 || !png.starts_with(SIGNATURE) || &png[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(png[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(png[20..24].try_into().ok()?);
    Some((width, height))
}

#[derive(Debug, Clone)]
struct BBoxWord {
    text: String,
    /// Top-left page space, as pdftotext reports it.
    region: Region,
}

#[derive(Debug, Clone)]
struct BBoxPage {
    height: f64,
    words: Vec<BBoxWord>,
}

impl BBoxPage {
    /// Words fully inside `region`, flipped into PDF user space.
    fn fragments_in(&self, region: &Region) -> Vec<TextFragment> {
        self.words
            .iter()
            .filter(|w| region.contains(&w.region))
            .map(|w| {
                TextFragment::new(
                    w.text.clone(),
                    w.region.x0,
                    self.height - w.region.y1,
                    w.region.x1,
                    self.height - w.region.y0,
                )
            })
            .collect()
    }
}

/// Parse `pdftotext -bbox` XHTML into pages of words.
fn parse_bbox_xml(xml: &str) -> Result<Vec<BBoxPage>, ZonexError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages = Vec::new();
    let mut current: Option<BBoxPage> = None;
    let mut open_word: Option<Region> = None;
    let mut word_text = String::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ZonexError::Extraction(format!("malformed bbox output: {e}")))?;
        match event {
            Event::Start(tag) => match tag.name().as_ref() {
                b"page" => {
                    current = Some(BBoxPage {
                        height: attr_f64(&tag, b"height")?.unwrap_or(0.0),
                        words: Vec::new(),
                    });
                }
                b"word" => {
                    open_word = word_region(&tag)?;
                    word_text.clear();
                }
                _ => {}
            },
            Event::Text(text) if open_word.is_some() => {
                let decoded = text
                    .unescape()
                    .map_err(|e| ZonexError::Extraction(format!("malformed bbox text: {e}")))?;
                word_text.push_str(&decoded);
            }
            Event::End(tag) => match tag.name().as_ref() {
                b"word" => {
                    if let (Some(region), Some(page)) = (open_word.take(), current.as_mut()) {
                        let text = word_text.trim();
                        if !text.is_empty() {
                            page.words.push(BBoxWord {
                                text: text.to_string(),
                                region,
                            });
                        }
                    }
                }
                b"page" => pages.extend(current.take()),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

fn word_region(tag: &BytesStart<'_>) -> Result<Option<Region>, ZonexError> {
    let coords = (
        attr_f64(tag, b"xMin")?,
        attr_f64(tag, b"yMin")?,
        attr_f64(tag, b"xMax")?,
        attr_f64(tag, b"yMax")?,
    );
    Ok(match coords {
        (Some(x0), Some(y0), Some(x1), Some(y1)) => Some(Region::new(x0, y0, x1, y1)),
        _ => None,
    })
}

fn attr_f64(tag: &BytesStart<'_>, name: &[u8]) -> Result<Option<f64>, ZonexError> {
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| ZonexError::Extraction(format!("malformed attribute: {e}")))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| ZonexError::Extraction(format!("malformed attribute: {e}")))?;
            return Ok(value.trim().parse().ok());
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BBOX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
<meta name="Producer" content="Test"/>
</head>
<body>
<doc>
  <page width="612.000000" height="792.000000">
    <word xMin="50.000000" yMin="100.000000" xMax="90.000000" yMax="112.000000">Widget</word>
    <word xMin="210.000000" yMin="100.500000" xMax="240.000000" yMax="112.000000">10.50</word>
    <word xMin="50.000000" yMin="700.000000" xMax="90.000000" yMax="712.000000">Tom &amp; Co</word>
  </page>
</doc>
</body>
</html>"#;

    #[test]
    fn test_parse_bbox_xml() {
        let pages = parse_bbox_xml(BBOX).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].height, 792.0);
        assert_eq!(pages[0].words.len(), 3);
        assert_eq!(pages[0].words[2].text, "Tom & Co");
        assert_eq!(pages[0].words[1].region, Region::new(210.0, 100.5, 240.0, 112.0));
    }

    #[test]
    fn test_fragments_in_flips_to_user_space() {
        let pages = parse_bbox_xml(BBOX).unwrap();
        let frags = pages[0].fragments_in(&Region::new(40.0, 90.0, 300.0, 200.0));
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0], TextFragment::new("Widget", 50.0, 680.0, 90.0, 692.0));
        assert_eq!(frags[1].text, "10.50");
    }

    #[test]
    fn test_crop_box_rounds_outward() {
        let crop = CropBox::new(&Region::new(10.4, 20.6, 110.2, 40.0), 72);
        assert_eq!(
            crop,
            CropBox {
                x: 10,
                y: 20,
                width: 101,
                height: 20
            }
        );

        let hi = CropBox::new(&Region::new(10.0, 20.0, 110.0, 40.0), 144);
        assert_eq!((hi.x, hi.y, hi.width, hi.height), (20, 40, 200, 40));
    }

    #[test]
    fn test_crop_box_never_empty() {
        let crop = CropBox::new(&Region::new(5.0, 5.0, 5.0, 5.0), 72);
        assert_eq!((crop.width, crop.height), (1, 1));
    }

    #[test]
    fn test_missing_render_output() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_render(Path::new("/usr/bin/pdftoppm"), &dir.path().join("region-0.png")).unwrap_err();
        match err {
            ZonexError::PopplerFailed { tool, stderr, .. } => {
                assert_eq!(tool, "pdftoppm");
                assert!(stderr.contains("region-0.png"));
            }
            other => panic!("expected PopplerFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_pdftotext_is_named() {
        let provider = PopplerProvider::with_config(PopplerConfig {
            pdftotext: PathBuf::from("/nonexistent/zonex-test/pdftotext"),
            ..PopplerConfig::default()
        });
        assert!(!provider.is_available());
        match provider.check_available() {
            Err(ZonexError::PopplerNotFound { tool }) => assert_eq!(tool, "pdftotext"),
            other => panic!("expected PopplerNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_page_count() {
        let info = "Title:          Invoice\nProducer:       Test\nPages:          3\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info), Some(3));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn test_png_dimensions() {
        let mut png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        png.extend_from_slice(&640u32.to_be_bytes());
        png.extend_from_slice(&20u32.to_be_bytes());
        assert_eq!(png_dimensions(&png), Some((640, 20)));
        assert_eq!(png_dimensions(b"not a png"), None);
    }
}
