use std::path::PathBuf;

use image::RgbImage;
use tesseract::Tesseract;

use sanskrit_ocr_core::{DEFAULT_LANGUAGE, OcrEngine, OcrError};

/// Bytes per pixel of the frames handed to Tesseract (packed RGB8).
const BYTES_PER_PIXEL: i32 = 3;

/// Settings for constructing a [`TesseractEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesseractConfig {
    /// Language code(s) as Tesseract expects them, e.g. `hin` or `san+hin`.
    pub language: String,
    /// Directory containing `<lang>.traineddata`. `None` lets Tesseract use
    /// its compiled-in default or `TESSDATA_PREFIX`.
    pub datapath: Option<PathBuf>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            datapath: None,
        }
    }
}

impl TesseractConfig {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_datapath(mut self, datapath: Option<PathBuf>) -> Self {
        self.datapath = datapath;
        self
    }
}

/// [`OcrEngine`] backed by the Tesseract C API.
///
/// The `tesseract` crate's builder methods consume the handle, so it is kept
/// in an `Option` and put back after each page. A call that fails midway
/// loses the handle; the next call re-initializes it from the stored config.
pub struct TesseractEngine {
    api: Option<Tesseract>,
    config: TesseractConfig,
}

impl TesseractEngine {
    /// Initialize Tesseract. Returns [`OcrError::Init`] if the language data
    /// cannot be loaded.
    pub fn new(config: TesseractConfig) -> Result<Self, OcrError> {
        let api = init(&config)?;
        tracing::info!(language = %config.language, "Tesseract initialized");
        Ok(Self {
            api: Some(api),
            config,
        })
    }
}

fn init(config: &TesseractConfig) -> Result<Tesseract, OcrError> {
    let datapath = match &config.datapath {
        Some(path) => Some(
            path.to_str()
                .ok_or_else(|| OcrError::Init("invalid tessdata path encoding".into()))?,
        ),
        None => None,
    };
    Tesseract::new(datapath, Some(config.language.as_str())).map_err(|e| {
        OcrError::Init(format!(
            "could not load language '{}' ({}): {}",
            config.language,
            datapath.unwrap_or("default tessdata"),
            e
        ))
    })
}

/// Frame geometry in the signed form the Tesseract API takes.
fn frame_geometry(image: &RgbImage) -> Result<(i32, i32, i32), OcrError> {
    let too_large = || {
        OcrError::Image(format!(
            "{}x{} image exceeds Tesseract limits",
            image.width(),
            image.height()
        ))
    };
    if image.width() == 0 || image.height() == 0 {
        return Err(OcrError::Image("empty image".into()));
    }
    let width = i32::try_from(image.width()).map_err(|_| too_large())?;
    let height = i32::try_from(image.height()).map_err(|_| too_large())?;
    let bytes_per_line = width.checked_mul(BYTES_PER_PIXEL).ok_or_else(too_large)?;
    Ok((width, height, bytes_per_line))
}

impl OcrEngine for TesseractEngine {
    fn recognize(&mut self, image: &RgbImage) -> Result<String, OcrError> {
        let (width, height, bytes_per_line) = frame_geometry(image)?;

        let api = match self.api.take() {
            Some(api) => api,
            None => {
                tracing::debug!("re-initializing Tesseract after a failed page");
                init(&self.config)?
            }
        };

        let mut api = api
            .set_frame(image.as_raw(), width, height, BYTES_PER_PIXEL, bytes_per_line)
            .map_err(|e| OcrError::Image(e.to_string()))?
            .recognize()
            .map_err(|e| OcrError::Recognition(e.to_string()))?;
        let text = api
            .get_text()
            .map_err(|e| OcrError::Recognition(e.to_string()));

        self.api = Some(api);
        let text = text?;
        tracing::trace!(width, height, chars = text.chars().count(), "page recognized");
        Ok(text)
    }
}
