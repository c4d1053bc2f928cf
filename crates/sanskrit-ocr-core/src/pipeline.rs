use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::backend::{BackendError, OcrEngine, OcrError, PdfBackend, PdfDocument};
use crate::text_layer::{has_usable_text, meaningful_chars};

/// Render resolution used for OCR when none is configured.
pub const DEFAULT_DPI: u32 = 300;
/// Minimum meaningful characters for a text layer to be used directly.
pub const DEFAULT_MIN_TEXT_CHARS: usize = 1;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Which branch produced a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Text,
    Ocr,
}

impl PageSource {
    pub fn label(&self) -> &'static str {
        match self {
            PageSource::Text => "Text Page",
            PageSource::Ocr => "OCR Page",
        }
    }
}

/// Text obtained for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// 1-based page number.
    pub number: usize,
    pub source: PageSource,
    pub text: String,
}

/// Step at which a page was given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipStage {
    Load,
    Render,
    Recognize,
}

/// Events delivered to the sink while a document is processed, in page order.
#[derive(Debug)]
pub enum PageEvent<'a> {
    /// A page was rasterized and is about to be recognized.
    Rendered { number: usize, image: &'a RgbImage },
    Page(PageResult),
    Skipped {
        number: usize,
        stage: SkipStage,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub text_pages: usize,
    pub ocr_pages: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Render resolution for OCR'd pages.
    pub dpi: u32,
    /// See [`has_usable_text`].
    pub min_text_chars: usize,
    /// Ignore the text layer and OCR every page.
    pub force_ocr: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            force_ocr: false,
        }
    }
}

enum PageOutcome {
    Done(PageResult),
    Skipped(SkipStage, String),
}

/// Per-page text-or-OCR decision loop.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractionOptions,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractionOptions) -> Self {
        Self { options }
    }

    /// Process every page of `doc` in order, delivering events to `sink`.
    ///
    /// Pages that cannot be loaded, rendered, or recognized are reported as
    /// [`PageEvent::Skipped`] and do not stop the run. Only sink errors are
    /// returned.
    pub fn process_document<F>(
        &self,
        doc: &dyn PdfDocument,
        engine: &mut dyn OcrEngine,
        mut sink: F,
    ) -> Result<RunSummary, PipelineError>
    where
        F: FnMut(PageEvent<'_>) -> std::io::Result<()>,
    {
        let total = doc.page_count();
        info!(pages = total, dpi = self.options.dpi, "processing document");

        let mut summary = RunSummary {
            total,
            ..RunSummary::default()
        };

        for index in 0..total {
            let number = index + 1;
            match self.run_page(doc, engine, index, &mut sink)? {
                PageOutcome::Done(result) => {
                    match result.source {
                        PageSource::Text => summary.text_pages += 1,
                        PageSource::Ocr => summary.ocr_pages += 1,
                    }
                    sink(PageEvent::Page(result))?;
                }
                PageOutcome::Skipped(stage, reason) => {
                    debug!(page = number, ?stage, %reason, "skipping page");
                    summary.skipped += 1;
                    sink(PageEvent::Skipped {
                        number,
                        stage,
                        reason,
                    })?;
                }
            }
        }

        info!(
            total = summary.total,
            text = summary.text_pages,
            ocr = summary.ocr_pages,
            skipped = summary.skipped,
            "document complete"
        );
        Ok(summary)
    }

    fn run_page<F>(
        &self,
        doc: &dyn PdfDocument,
        engine: &mut dyn OcrEngine,
        index: usize,
        sink: &mut F,
    ) -> Result<PageOutcome, PipelineError>
    where
        F: FnMut(PageEvent<'_>) -> std::io::Result<()>,
    {
        let number = index + 1;

        if !self.options.force_ocr {
            let text = match doc.page_text(index) {
                Ok(text) => text,
                Err(e) => return Ok(PageOutcome::Skipped(SkipStage::Load, e.to_string())),
            };
            if has_usable_text(&text, self.options.min_text_chars) {
                debug!(
                    page = number,
                    chars = meaningful_chars(&text),
                    "using embedded text"
                );
                return Ok(PageOutcome::Done(PageResult {
                    number,
                    source: PageSource::Text,
                    text,
                }));
            }
            debug!(page = number, "text layer blank, falling back to OCR");
        }

        // Renderers load the page themselves, so a load failure can surface here.
        let image = match doc.render_page(index, self.options.dpi) {
            Ok(image) => image,
            Err(e @ BackendError::Page { .. }) => {
                return Ok(PageOutcome::Skipped(SkipStage::Load, e.to_string()));
            }
            Err(e) => return Ok(PageOutcome::Skipped(SkipStage::Render, e.to_string())),
        };
        trace!(
            page = number,
            width = image.width(),
            height = image.height(),
            "page rendered"
        );
        sink(PageEvent::Rendered {
            number,
            image: &image,
        })?;

        match engine.recognize(&image) {
            Ok(text) => Ok(PageOutcome::Done(PageResult {
                number,
                source: PageSource::Ocr,
                text,
            })),
            Err(e) => Ok(PageOutcome::Skipped(SkipStage::Recognize, e.to_string())),
        }
    }
}

/// Run the whole extraction for one file.
///
/// Order matters for error reporting: the document is opened first, then the
/// OCR engine is initialized, then pages are processed. Failure of either of
/// the first two steps is returned before any page is touched.
pub fn extract_pdf<E, I, F>(
    path: &Path,
    backend: &dyn PdfBackend,
    init_ocr: I,
    extractor: &Extractor,
    sink: F,
) -> Result<RunSummary, PipelineError>
where
    E: OcrEngine,
    I: FnOnce() -> Result<E, OcrError>,
    F: FnMut(PageEvent<'_>) -> std::io::Result<()>,
{
    let doc = backend.open(path)?;
    let mut engine = init_ocr()?;
    extractor.process_document(doc.as_ref(), &mut engine, sink)
}
