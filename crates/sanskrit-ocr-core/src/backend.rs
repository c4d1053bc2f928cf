use std::path::Path;

use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to load page {page}: {message}")]
    Page { page: usize, message: String },
    #[error("failed to render page {page}: {message}")]
    Render { page: usize, message: String },
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine initialization failed: {0}")]
    Init(String),
    #[error("invalid image for OCR: {0}")]
    Image(String),
    #[error("OCR recognition failed: {0}")]
    Recognition(String),
}

/// Factory for opened PDF documents.
///
/// Implementors own whatever library state is needed to open files; the
/// per-page decision logic lives in [`crate::pipeline::Extractor`].
pub trait PdfBackend: Send + Sync {
    /// Open a PDF file for page-by-page access.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError>;
}

/// An opened PDF. Page indices are 0-based.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Text layer of one page, one line per `\n`.
    fn page_text(&self, index: usize) -> Result<String, BackendError>;

    /// Rasterize one page at `dpi` dots per inch.
    fn render_page(&self, index: usize, dpi: u32) -> Result<RgbImage, BackendError>;
}

/// Image-to-text recognizer.
///
/// Takes `&mut self` because engines keep mutable recognition state between
/// calls and are driven from a single thread.
pub trait OcrEngine {
    fn recognize(&mut self, image: &RgbImage) -> Result<String, OcrError>;
}
