use std::{path::Path, sync::Arc};

use docagent_core::OcrConfig;
use tracing::{debug, info, warn};

use crate::{
  ExtractError, FileKind, OcrEngine, PageRasterizer, PdfTextLayer, PdftoppmRasterizer, Result, TesseractOcr,
  TextLayer, ocr_pdf, read_text_file,
};

/// Converts one file into plain text, picking a strategy by file type
#[derive(Clone)]
pub struct Extractor {
  text_layer: Arc<dyn TextLayer>,
  rasterizer: Arc<dyn PageRasterizer>,
  ocr: Arc<dyn OcrEngine>,
}

impl Default for Extractor {
  fn default() -> Self {
    Self::from_config(&OcrConfig::default())
  }
}

impl Extractor {
  pub fn new(text_layer: Arc<dyn TextLayer>, rasterizer: Arc<dyn PageRasterizer>, ocr: Arc<dyn OcrEngine>) -> Self {
    Self {
      text_layer,
      rasterizer,
      ocr,
    }
  }

  pub fn from_config(config: &OcrConfig) -> Self {
    Self::new(
      Arc::new(PdfTextLayer::from_config(config)),
      Arc::new(PdftoppmRasterizer::from_config(config)),
      Arc::new(TesseractOcr::from_config(config)),
    )
  }

  /// Extract the text of `path`.
  ///
  /// A result that is empty or whitespace-only is reported as [`ExtractError::Empty`].
  #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
  pub async fn extract(&self, path: &Path) -> Result<String> {
    let kind = FileKind::from_path(path)?;

    let text = match kind {
      FileKind::Text => read_text_file(path).await?,
      FileKind::Pdf => self.extract_pdf(path).await?,
      FileKind::Image => self.ocr.recognize(path).await?,
    };

    if text.trim().is_empty() {
      return Err(ExtractError::Empty(path.display().to_string()));
    }

    debug!(%kind, chars = text.chars().count(), "Extracted text");
    Ok(text)
  }

  async fn extract_pdf(&self, path: &Path) -> Result<String> {
    match self.text_layer.extract_text(path).await {
      Ok(text) if !text.trim().is_empty() => return Ok(text),
      Ok(_) => info!(path = %path.display(), "PDF has no text layer, falling back to OCR"),
      Err(e) => warn!(path = %path.display(), err = %e, "PDF text extraction failed, falling back to OCR"),
    }

    ocr_pdf(self.rasterizer.as_ref(), self.ocr.as_ref(), path).await
  }
}
