use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::RgbImage;
use owo_colors::OwoColorize;
use sanskrit_ocr_core::{PageResult, PageSource};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Page output sink: stdout, or a file given by `--output`.
///
/// The file is created on the first write, so a run that fails before any
/// page is printed leaves an existing file untouched.
pub struct PageWriter {
    path: Option<PathBuf>,
    inner: Option<Box<dyn Write>>,
}

impl PageWriter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, inner: None }
    }

    fn writer(&mut self) -> io::Result<&mut Box<dyn Write>> {
        let writer = match self.inner.take() {
            Some(writer) => writer,
            None => open_target(self.path.as_deref())?,
        };
        Ok(self.inner.insert(writer))
    }

    /// Flush everything written. A run that printed no pages still creates
    /// the output file, empty.
    pub fn finish(mut self) -> io::Result<()> {
        self.writer()?.flush()
    }
}

fn open_target(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("failed to create output file {}: {e}", path.display()),
                )
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

impl Write for PageWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Print one page block: the `[<label> N]:` line, the text, a blank line.
pub fn print_page(w: &mut dyn Write, page: &PageResult, color: ColorMode) -> io::Result<()> {
    let label = format!("[{} {}]:", page.source.label(), page.number);
    if color.enabled() {
        match page.source {
            PageSource::Text => writeln!(w, "{}", label.green().bold())?,
            PageSource::Ocr => writeln!(w, "{}", label.cyan().bold())?,
        }
    } else {
        writeln!(w, "{}", label)?;
    }
    write!(w, "{}\n\n", page.text)
}

/// File name used for a saved page image.
pub fn page_image_path(dir: &Path, number: usize) -> PathBuf {
    dir.join(format!("page-{number}.png"))
}

/// Writes rendered pages for `--save-images`. The directory is created with
/// the first image. Failures are logged, not returned.
pub struct ImageSaver {
    dir: PathBuf,
    dir_ready: bool,
}

impl ImageSaver {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            dir_ready: false,
        }
    }

    pub fn save(&mut self, number: usize, image: &RgbImage) {
        if !self.dir_ready {
            if let Err(e) = std::fs::create_dir_all(&self.dir) {
                tracing::warn!(dir = %self.dir.display(), error = %e, "could not create image directory");
                return;
            }
            self.dir_ready = true;
        }

        let path = page_image_path(&self.dir, number);
        match image.save(&path) {
            Ok(()) => tracing::debug!(page = number, path = %path.display(), "saved page image"),
            Err(e) => tracing::warn!(page = number, path = %path.display(), error = %e, "could not save page image"),
        }
    }
}
