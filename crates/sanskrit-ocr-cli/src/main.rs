use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use sanskrit_ocr_core::config_file::{self, ConfigFile};
use sanskrit_ocr_core::{
    DEFAULT_LANGUAGE, ExtractionOptions, Extractor, PageEvent, PipelineError, extract_pdf,
};
use sanskrit_ocr_mupdf::MupdfBackend;
use sanskrit_ocr_tesseract::{TesseractConfig, TesseractEngine};
use tracing_subscriber::EnvFilter;

mod output;

use output::{ColorMode, ImageSaver, PageWriter};

const MIN_DPI: u32 = 72;
const MAX_DPI: u32 = 1200;

/// Sanskrit PDF text extractor - uses each page's text layer, and OCRs pages
/// whose text layer is blank with a Devanagari-trained Tesseract model
#[derive(Parser, Debug)]
#[command(name = "sanskrit-ocr", version, about, long_about = None)]
struct Cli {
    /// Path to the PDF file to extract
    pdf_path: PathBuf,

    /// Tesseract language(s), e.g. "hin" or "san+hin" [default: hin]
    #[arg(short, long)]
    lang: Option<String>,

    /// Directory containing Tesseract .traineddata files
    #[arg(long)]
    tessdata: Option<PathBuf>,

    /// Render resolution for OCR'd pages [default: 300]
    #[arg(long, value_parser = clap::value_parser!(u32).range(72..=1200))]
    dpi: Option<u32>,

    /// Minimum non-whitespace characters for a text layer to be used [default: 1]
    #[arg(long)]
    min_chars: Option<usize>,

    /// OCR every page, ignoring the text layer
    #[arg(long)]
    force_ocr: bool,

    /// Write page text to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save each OCR'd page image as page-N.png in this directory
    #[arg(long)]
    save_images: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = config_file::load_config();
    let (options, tesseract) = resolve_settings(&cli, &file_config);
    run(&cli, options, tesseract)
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve configuration: CLI flags > config file > defaults
fn resolve_settings(cli: &Cli, file: &ConfigFile) -> (ExtractionOptions, TesseractConfig) {
    let from_file = file.extraction_options();
    let options = ExtractionOptions {
        dpi: cli.dpi.unwrap_or(from_file.dpi).clamp(MIN_DPI, MAX_DPI),
        min_text_chars: cli.min_chars.unwrap_or(from_file.min_text_chars),
        force_ocr: cli.force_ocr || from_file.force_ocr,
    };

    let language = cli
        .lang
        .clone()
        .or_else(|| file.language().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let datapath = cli
        .tessdata
        .clone()
        .or_else(|| file.tessdata_dir().map(PathBuf::from));
    let tesseract = TesseractConfig::default()
        .with_language(language)
        .with_datapath(datapath);

    (options, tesseract)
}

fn run(cli: &Cli, options: ExtractionOptions, tesseract: TesseractConfig) -> anyhow::Result<()> {
    // Only color a terminal stdout so piped output stays byte-exact
    let use_color = !cli.no_color && cli.output.is_none() && std::io::stdout().is_terminal();
    let color = ColorMode(use_color);

    // Nothing is created on disk until the document is open and OCR is ready.
    let mut writer = PageWriter::new(cli.output.clone());
    let mut images = cli.save_images.clone().map(ImageSaver::new);

    let extractor = Extractor::with_options(options);
    let result = extract_pdf(
        &cli.pdf_path,
        &MupdfBackend::new(),
        || TesseractEngine::new(tesseract),
        &extractor,
        |event| match event {
            PageEvent::Page(page) => output::print_page(&mut writer, &page, color),
            PageEvent::Rendered { number, image } => {
                if let Some(images) = images.as_mut() {
                    images.save(number, image);
                }
                Ok(())
            }
            PageEvent::Skipped { .. } => Ok(()),
        },
    );

    match result {
        Ok(_) => {}
        Err(PipelineError::Backend(e)) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to open PDF file {}", cli.pdf_path.display())));
        }
        Err(PipelineError::Ocr(e)) => {
            return Err(anyhow::Error::new(e).context("Tesseract OCR initialization failed"));
        }
        Err(e) => return Err(e.into()),
    }

    writer.finish().context("Failed to write output")?;
    Ok(())
}
