pub mod backend;
pub mod config_file;
pub mod pipeline;
pub mod pixels;
pub mod text_layer;

// Re-export for convenience
pub use backend::{BackendError, OcrEngine, OcrError, PdfBackend, PdfDocument};
pub use pipeline::{
    DEFAULT_DPI, DEFAULT_MIN_TEXT_CHARS, ExtractionOptions, Extractor, PageEvent, PageResult,
    PageSource, PipelineError, RunSummary, SkipStage, extract_pdf,
};
pub use text_layer::has_usable_text;

/// Default Tesseract language. `hin` is trained on Devanagari and handles
/// Sanskrit text well.
pub const DEFAULT_LANGUAGE: &str = "hin";
