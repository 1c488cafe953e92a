use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
  #[error("unsupported file type: {0}")]
  UnsupportedType(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("{0} not found; install it or set its path under [ocr]")]
  ToolMissing(String),

  #[error("{tool} failed (exit {status}): {stderr}")]
  ToolFailed { tool: String, status: i32, stderr: String },

  #[error("PDF error: {0}")]
  Pdf(String),

  #[error("no text extracted from {0}")]
  Empty(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
