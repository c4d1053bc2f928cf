//! Integration tests for the page pipeline.
//!
//! A hand-rolled document and OCR engine stand in for MuPDF and Tesseract
//! so that the branch decisions can be observed without native libraries.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use image::RgbImage;
use sanskrit_ocr_core::{
    BackendError, ExtractionOptions, Extractor, OcrEngine, OcrError, PageEvent, PageResult,
    PageSource, PdfBackend, PdfDocument, PipelineError, RunSummary, SkipStage, extract_pdf,
};

/// Scripted behavior for one page of a [`MockDocument`].
#[derive(Clone)]
enum MockPage {
    /// Page whose text layer returns this string.
    Text(&'static str),
    /// Page that fails to load.
    LoadError,
    /// Blank page that fails to render.
    RenderError,
}

struct MockDocument {
    pages: Vec<MockPage>,
    renders: Rc<Cell<usize>>,
}

impl MockDocument {
    fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            renders: Rc::new(Cell::new(0)),
        }
    }
}

impl PdfDocument for MockDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        match &self.pages[index] {
            MockPage::Text(text) => Ok(text.to_string()),
            MockPage::LoadError => Err(BackendError::Page {
                page: index + 1,
                message: "corrupt page object".into(),
            }),
            MockPage::RenderError => Ok(String::new()),
        }
    }

    fn render_page(&self, index: usize, _dpi: u32) -> Result<RgbImage, BackendError> {
        self.renders.set(self.renders.get() + 1);
        match &self.pages[index] {
            MockPage::LoadError => Err(BackendError::Page {
                page: index + 1,
                message: "corrupt page object".into(),
            }),
            MockPage::RenderError => Err(BackendError::Render {
                page: index + 1,
                message: "empty pixmap".into(),
            }),
            // Encode the page index in the image width so the OCR mock can
            // tell pages apart.
            _ => Ok(RgbImage::new(index as u32 + 1, 1)),
        }
    }
}

/// OCR engine that returns a fixed string per call and counts calls.
struct MockOcr {
    calls: Rc<Cell<usize>>,
    fail_on_width: Option<u32>,
}

impl MockOcr {
    fn new() -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            fail_on_width: None,
        }
    }
}

impl OcrEngine for MockOcr {
    fn recognize(&mut self, image: &RgbImage) -> Result<String, OcrError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_on_width == Some(image.width()) {
            return Err(OcrError::Recognition("engine returned no text".into()));
        }
        Ok(format!("ओम् {}", image.width()))
    }
}

struct MockBackend {
    pages: Option<Vec<MockPage>>,
}

impl PdfBackend for MockBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        match &self.pages {
            Some(pages) => Ok(Box::new(MockDocument::new(pages.clone()))),
            None => Err(BackendError::Open(format!("{} is not a PDF", path.display()))),
        }
    }
}

fn run(
    doc: &MockDocument,
    ocr: &mut MockOcr,
) -> (RunSummary, Vec<PageResult>, Vec<(usize, SkipStage)>) {
    let mut pages = Vec::new();
    let mut skipped = Vec::new();
    let summary = Extractor::new()
        .process_document(doc, ocr, |event| {
            match event {
                PageEvent::Page(result) => pages.push(result),
                PageEvent::Skipped { number, stage, .. } => skipped.push((number, stage)),
                PageEvent::Rendered { .. } => {}
            }
            Ok(())
        })
        .unwrap();
    (summary, pages, skipped)
}

#[test]
fn text_only_document_never_invokes_ocr() {
    let doc = MockDocument::new(vec![
        MockPage::Text("अथ योगानुशासनम्"),
        MockPage::Text("योगश्चित्तवृत्तिनिरोधः"),
    ]);
    let mut ocr = MockOcr::new();

    let (summary, pages, _) = run(&doc, &mut ocr);

    assert_eq!(ocr.calls.get(), 0);
    assert_eq!(doc.renders.get(), 0);
    assert_eq!(summary.text_pages, 2);
    assert!(pages.iter().all(|p| p.source == PageSource::Text));
    assert_eq!(pages[1].text, "योगश्चित्तवृत्तिनिरोधः");
}

#[test]
fn blank_page_goes_through_ocr() {
    let doc = MockDocument::new(vec![MockPage::Text("embedded"), MockPage::Text(" \n\t\n")]);
    let mut ocr = MockOcr::new();

    let (summary, pages, _) = run(&doc, &mut ocr);

    assert_eq!(ocr.calls.get(), 1);
    assert_eq!(summary.ocr_pages, 1);
    assert_eq!(pages[1].source, PageSource::Ocr);
    assert_eq!(pages[1].text, "ओम् 2");
}

#[test]
fn unmapped_glyph_page_goes_through_ocr() {
    let doc = MockDocument::new(vec![MockPage::Text("\u{FFFD}\u{FFFD}\u{FFFD}\n")]);
    let mut ocr = MockOcr::new();

    let (_, pages, _) = run(&doc, &mut ocr);

    assert_eq!(pages[0].source, PageSource::Ocr);
}

#[test]
fn numbering_is_one_based_and_sequential_across_branches() {
    let doc = MockDocument::new(vec![
        MockPage::Text("first"),
        MockPage::Text(""),
        MockPage::LoadError,
        MockPage::Text("fourth"),
        MockPage::RenderError,
        MockPage::Text("   "),
    ]);
    let mut ocr = MockOcr::new();

    let (summary, pages, skipped) = run(&doc, &mut ocr);

    let numbers: Vec<usize> = pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![1, 2, 4, 6]);
    let sources: Vec<PageSource> = pages.iter().map(|p| p.source).collect();
    assert_eq!(
        sources,
        vec![
            PageSource::Text,
            PageSource::Ocr,
            PageSource::Text,
            PageSource::Ocr
        ]
    );
    assert_eq!(skipped, vec![(3, SkipStage::Load), (5, SkipStage::Render)]);
    assert_eq!(
        summary,
        RunSummary {
            total: 6,
            text_pages: 2,
            ocr_pages: 2,
            skipped: 2,
        }
    );
}

#[test]
fn unloadable_page_under_force_ocr_is_a_load_skip() {
    let doc = MockDocument::new(vec![MockPage::LoadError, MockPage::Text("x")]);
    let mut ocr = MockOcr::new();
    let mut pages = Vec::new();
    let mut skipped = Vec::new();

    Extractor::with_options(ExtractionOptions {
        force_ocr: true,
        ..ExtractionOptions::default()
    })
    .process_document(&doc, &mut ocr, |event| {
        match event {
            PageEvent::Page(result) => pages.push(result),
            PageEvent::Skipped { number, stage, .. } => skipped.push((number, stage)),
            PageEvent::Rendered { .. } => {}
        }
        Ok(())
    })
    .unwrap();

    assert_eq!(skipped, vec![(1, SkipStage::Load)]);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].number, 2);
    assert_eq!(pages[0].source, PageSource::Ocr);
    assert_eq!(ocr.calls.get(), 1);
}

#[test]
fn recognition_failure_skips_only_that_page() {
    let doc = MockDocument::new(vec![MockPage::Text(""), MockPage::Text("")]);
    let mut ocr = MockOcr {
        fail_on_width: Some(1),
        ..MockOcr::new()
    };

    let (summary, pages, skipped) = run(&doc, &mut ocr);

    assert_eq!(ocr.calls.get(), 2);
    assert_eq!(skipped, vec![(1, SkipStage::Recognize)]);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].number, 2);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn rendered_event_precedes_ocr_page() {
    let doc = MockDocument::new(vec![MockPage::Text("")]);
    let mut ocr = MockOcr::new();
    let mut order = Vec::new();

    Extractor::new()
        .process_document(&doc, &mut ocr, |event| {
            order.push(match event {
                PageEvent::Rendered { number, image } => format!("rendered {number} {}", image.width()),
                PageEvent::Page(result) => format!("page {}", result.number),
                PageEvent::Skipped { number, .. } => format!("skipped {number}"),
            });
            Ok(())
        })
        .unwrap();

    assert_eq!(order, vec!["rendered 1 1", "page 1"]);
}

#[test]
fn sink_error_stops_the_run() {
    let doc = MockDocument::new(vec![MockPage::Text("a"), MockPage::Text("b")]);
    let mut ocr = MockOcr::new();
    let mut seen = 0;

    let result = Extractor::new().process_document(&doc, &mut ocr, |_| {
        seen += 1;
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    });

    assert!(matches!(result, Err(PipelineError::Output(_))));
    assert_eq!(seen, 1);
}

#[test]
fn empty_document_produces_no_pages() {
    let doc = MockDocument::new(vec![]);
    let mut ocr = MockOcr::new();

    let (summary, pages, _) = run(&doc, &mut ocr);

    assert!(pages.is_empty());
    assert_eq!(summary, RunSummary::default());
}

#[test]
fn unopenable_document_never_initializes_ocr() {
    let backend = MockBackend { pages: None };
    let initialized = Cell::new(false);

    let result = extract_pdf(
        Path::new("missing.pdf"),
        &backend,
        || {
            initialized.set(true);
            Ok(MockOcr::new())
        },
        &Extractor::new(),
        |_| Ok(()),
    );

    assert!(matches!(result, Err(PipelineError::Backend(BackendError::Open(_)))));
    assert!(!initialized.get());
}

#[test]
fn ocr_init_failure_is_fatal_before_any_page() {
    let backend = MockBackend {
        pages: Some(vec![MockPage::Text("text")]),
    };
    let mut events = 0;

    let result = extract_pdf(
        Path::new("book.pdf"),
        &backend,
        || Err::<MockOcr, _>(OcrError::Init("no traineddata for hin".into())),
        &Extractor::new(),
        |_| {
            events += 1;
            Ok(())
        },
    );

    assert!(matches!(result, Err(PipelineError::Ocr(OcrError::Init(_)))));
    assert_eq!(events, 0);
}

#[test]
fn extract_pdf_runs_all_pages() {
    let backend = MockBackend {
        pages: Some(vec![MockPage::Text("text"), MockPage::Text("")]),
    };
    let mut labels = Vec::new();

    let summary = extract_pdf(
        Path::new("book.pdf"),
        &backend,
        || Ok(MockOcr::new()),
        &Extractor::with_options(ExtractionOptions::default()),
        |event| {
            if let PageEvent::Page(result) = event {
                labels.push(format!("{} {}", result.source.label(), result.number));
            }
            Ok(())
        },
    )
    .unwrap();

    assert_eq!(labels, vec!["Text Page 1", "OCR Page 2"]);
    assert_eq!(summary.total, 2);
}
