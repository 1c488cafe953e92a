//! Optical character recognition via external tools.
//!
//! PDFs are rasterised page by page with `pdftoppm` into a scratch directory
//! that is removed when recognition finishes, whatever the outcome. Each page
//! image is then handed to `tesseract`.

use std::{
  ffi::OsStr,
  path::{Path, PathBuf},
};

use async_trait::async_trait;
use docagent_core::OcrConfig;
use tracing::{debug, warn};

use crate::{Result, tool::run_tool};

/// Recognises the text in a single image
#[async_trait]
pub trait OcrEngine: Send + Sync {
  async fn recognize(&self, image: &Path) -> Result<String>;
}

/// Renders every page of a PDF into `out_dir`, returning the images in page order
#[async_trait]
pub trait PageRasterizer: Send + Sync {
  async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone)]
pub struct TesseractOcr {
  program: String,
  language: String,
}

impl Default for TesseractOcr {
  fn default() -> Self {
    Self::new("tesseract", "eng")
  }
}

impl TesseractOcr {
  pub fn new(program: impl Into<String>, language: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      language: language.into(),
    }
  }

  pub fn from_config(config: &OcrConfig) -> Self {
    Self::new(&config.tesseract_path, &config.language)
  }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
  async fn recognize(&self, image: &Path) -> Result<String> {
    let out = run_tool(
      &self.program,
      [
        image.as_os_str(),
        OsStr::new("stdout"),
        OsStr::new("-l"),
        OsStr::new(&self.language),
      ],
    )
    .await?;
    Ok(String::from_utf8_lossy(&out).trim().to_string())
  }
}

#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
  program: String,
}

impl Default for PdftoppmRasterizer {
  fn default() -> Self {
    Self::new("pdftoppm")
  }
}

impl PdftoppmRasterizer {
  pub fn new(program: impl Into<String>) -> Self {
    Self { program: program.into() }
  }

  pub fn from_config(config: &OcrConfig) -> Self {
    Self::new(&config.pdftoppm_path)
  }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
  async fn rasterize(&self, pdf: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let prefix = out_dir.join("page");
    run_tool(&self.program, [OsStr::new("-png"), pdf.as_os_str(), prefix.as_os_str()]).await?;
    page_images(out_dir)
  }
}

/// Page number of a `page-<n>.png` file; pdftoppm zero-pads to the page count width
fn page_number(path: &Path) -> Option<u32> {
  if path.extension()? != "png" {
    return None;
  }
  path.file_stem()?.to_str()?.strip_prefix("page-")?.parse().ok()
}

fn page_images(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
    .filter_map(|entry| entry.ok())
    .map(|entry| entry.path())
    .filter_map(|path| page_number(&path).map(|n| (n, path)))
    .collect();
  pages.sort_by_key(|(n, _)| *n);
  Ok(pages.into_iter().map(|(_, path)| path).collect())
}

/// Rasterise `pdf` and recognise every page.
///
/// A page that fails recognition is logged and skipped; the remaining pages are
/// still joined with `\n` and the combined text is trimmed.
#[tracing::instrument(level = "debug", skip(rasterizer, engine), fields(pdf = %pdf.display()))]
pub async fn ocr_pdf(rasterizer: &dyn PageRasterizer, engine: &dyn OcrEngine, pdf: &Path) -> Result<String> {
  let scratch = tempfile::Builder::new().prefix("docagent-ocr").tempdir()?;
  let pages = rasterizer.rasterize(pdf, scratch.path()).await?;
  debug!(pages = pages.len(), "Rasterised PDF");

  let mut texts = Vec::with_capacity(pages.len());
  for (page, image) in pages.iter().enumerate() {
    match engine.recognize(image).await {
      Ok(text) => texts.push(text),
      Err(e) => warn!(page = page + 1, err = %e, "OCR failed for page, skipping"),
    }
  }

  Ok(texts.join("\n").trim().to_string())
}
