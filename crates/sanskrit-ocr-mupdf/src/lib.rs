use std::path::Path;

use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix, Page, TextPageFlags};

use sanskrit_ocr_core::pixels::{dpi_scale, rgb_from_samples};
use sanskrit_ocr_core::text_layer::REPLACEMENT_CHAR;
use sanskrit_ocr_core::{BackendError, PdfBackend, PdfDocument};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the only one that links mupdf (AGPL-3.0); the page
/// pipeline in `sanskrit-ocr-core` does not depend on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::Open("invalid path encoding".into()))?;

        let document = Document::open(path_str).map_err(|e| BackendError::Open(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::Open(e.to_string()))?;
        let page_count = usize::try_from(page_count).unwrap_or(0);

        tracing::debug!(path = %path.display(), pages = page_count, "opened PDF");
        Ok(Box::new(MupdfDocument {
            document,
            page_count,
        }))
    }
}

/// A document opened through [`MupdfBackend`].
pub struct MupdfDocument {
    document: Document,
    page_count: usize,
}

impl MupdfDocument {
    fn load_page(&self, index: usize) -> Result<Page, BackendError> {
        let page_no = i32::try_from(index).map_err(|_| BackendError::Page {
            page: index + 1,
            message: "page index out of range".into(),
        })?;
        self.document
            .load_page(page_no)
            .map_err(|e| BackendError::Page {
                page: index + 1,
                message: e.to_string(),
            })
    }
}

/// Append one text line, with U+FFFD for glyphs that have no Unicode value.
fn push_line(out: &mut String, chars: impl IntoIterator<Item = Option<char>>) {
    out.extend(chars.into_iter().map(|c| c.unwrap_or(REPLACEMENT_CHAR)));
    out.push('\n');
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        let page = self.load_page(index)?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::Page {
                page: index + 1,
                message: e.to_string(),
            })?;

        // Block/line iteration, one newline per line
        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                push_line(&mut page_text, line.chars().map(|c| c.char()));
            }
        }
        Ok(page_text)
    }

    fn render_page(&self, index: usize, dpi: u32) -> Result<RgbImage, BackendError> {
        let render_error = |message: String| BackendError::Render {
            page: index + 1,
            message,
        };

        let page = self.load_page(index)?;
        let scale = dpi_scale(dpi);
        let matrix = Matrix::new_scale(scale, scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, true)
            .map_err(|e| render_error(e.to_string()))?;

        let (width, height) = match (u32::try_from(pixmap.width()), u32::try_from(pixmap.height()))
        {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(render_error("invalid pixmap dimensions".into())),
        };
        let stride = usize::try_from(pixmap.stride())
            .map_err(|_| render_error("negative pixmap stride".into()))?;
        let components = pixmap.n() as usize;
        tracing::trace!(page = index + 1, width, height, components, stride, "pixmap rendered");

        rgb_from_samples(width, height, components, stride, pixmap.samples()).ok_or_else(|| {
            render_error(format!(
                "invalid pixmap {}x{} with {} components",
                width, height, components
            ))
        })
    }
}
