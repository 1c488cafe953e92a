use std::{ffi::OsStr, path::Path};

use async_trait::async_trait;
use docagent_core::OcrConfig;
use tracing::{debug, warn};

use crate::{ExtractError, Result, tool::run_tool};

/// Reads a PDF's embedded text layer.
///
/// Returning an empty or whitespace-only string means the document has no
/// usable text layer (typically a scan).
#[async_trait]
pub trait TextLayer: Send + Sync {
  async fn extract_text(&self, path: &Path) -> Result<String>;
}

/// `pdf-extract`, with an optional `pdftotext -layout` retry
#[derive(Debug, Clone)]
pub struct PdfTextLayer {
  pdftotext: Option<String>,
}

impl Default for PdfTextLayer {
  fn default() -> Self {
    Self {
      pdftotext: Some("pdftotext".to_string()),
    }
  }
}

impl PdfTextLayer {
  pub fn new(pdftotext: Option<String>) -> Self {
    Self { pdftotext }
  }

  pub fn from_config(config: &OcrConfig) -> Self {
    Self::new(config.use_pdftotext.then(|| config.pdftotext_path.clone()))
  }

  async fn native(&self, path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
      .await
      .map_err(|e| ExtractError::Pdf(format!("task join error: {e}")))?
      .map_err(|e| ExtractError::Pdf(e.to_string()))
  }

  async fn pdftotext(program: &str, path: &Path) -> Result<String> {
    let out = run_tool(program, [OsStr::new("-layout"), path.as_os_str(), OsStr::new("-")]).await?;
    Ok(String::from_utf8_lossy(&out).into_owned())
  }
}

#[async_trait]
impl TextLayer for PdfTextLayer {
  #[tracing::instrument(level = "debug", skip(self), fields(path = %path.display()))]
  async fn extract_text(&self, path: &Path) -> Result<String> {
    let native = self.native(path).await;
    match &native {
      Ok(text) if !text.trim().is_empty() => return native,
      Ok(_) => debug!("Embedded text layer is empty"),
      Err(e) => warn!(err = %e, "pdf-extract failed"),
    }

    let Some(program) = &self.pdftotext else {
      return native;
    };

    match Self::pdftotext(program, path).await {
      Ok(text) if !text.trim().is_empty() => {
        debug!(chars = text.len(), "Recovered text layer with pdftotext");
        Ok(text)
      }
      Ok(_) => native,
      Err(e) => {
        debug!(err = %e, "pdftotext retry failed");
        native
      }
    }
  }
}
