use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::pipeline::ExtractionOptions;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigFile {
    pub ocr: Option<OcrConfig>,
    pub extraction: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code(s), e.g. `hin` or `san+hin`.
    pub language: Option<String>,
    pub tessdata_dir: Option<String>,
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExtractionConfig {
    pub min_text_chars: Option<usize>,
    pub force_ocr: Option<bool>,
}

impl ConfigFile {
    pub fn language(&self) -> Option<&str> {
        self.ocr.as_ref().and_then(|o| o.language.as_deref())
    }

    pub fn tessdata_dir(&self) -> Option<&str> {
        self.ocr.as_ref().and_then(|o| o.tessdata_dir.as_deref())
    }

    /// Extraction options with file values applied over the defaults.
    pub fn extraction_options(&self) -> ExtractionOptions {
        let defaults = ExtractionOptions::default();
        ExtractionOptions {
            dpi: self.ocr.as_ref().and_then(|o| o.dpi).unwrap_or(defaults.dpi),
            min_text_chars: self
                .extraction
                .as_ref()
                .and_then(|e| e.min_text_chars)
                .unwrap_or(defaults.min_text_chars),
            force_ocr: self
                .extraction
                .as_ref()
                .and_then(|e| e.force_ocr)
                .unwrap_or(defaults.force_ocr),
        }
    }
}

/// Platform config directory path: `<config_dir>/sanskrit-ocr/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sanskrit-ocr").join("config.toml"))
}

/// Load config by cascading CWD `.sanskrit-ocr.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".sanskrit-ocr.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        ocr: Some(OcrConfig {
            language: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.language.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.language.clone())),
            tessdata_dir: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.tessdata_dir.clone())
                .or_else(|| base.ocr.as_ref().and_then(|o| o.tessdata_dir.clone())),
            dpi: overlay
                .ocr
                .as_ref()
                .and_then(|o| o.dpi)
                .or_else(|| base.ocr.as_ref().and_then(|o| o.dpi)),
        }),
        extraction: Some(ExtractionConfig {
            min_text_chars: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.min_text_chars)
                .or_else(|| base.extraction.as_ref().and_then(|e| e.min_text_chars)),
            force_ocr: overlay
                .extraction
                .as_ref()
                .and_then(|e| e.force_ocr)
                .or_else(|| base.extraction.as_ref().and_then(|e| e.force_ocr)),
        }),
    }
}
