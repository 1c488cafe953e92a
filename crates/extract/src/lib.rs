//! File to plain-text extraction.
//!
//! Text and markdown are read verbatim. PDFs use their embedded text layer and
//! fall back to rasterising every page and running OCR when that layer is
//! missing. Images go straight to OCR.

mod error;
mod extractor;
mod kind;
pub mod ocr;
pub mod pdf;
mod text;
mod tool;

pub use error::{ExtractError, Result};
pub use extractor::Extractor;
pub use kind::{FileKind, SUPPORTED_EXTENSIONS};
pub use ocr::{OcrEngine, PageRasterizer, PdftoppmRasterizer, TesseractOcr, ocr_pdf};
pub use pdf::{PdfTextLayer, TextLayer};
pub use text::read_text_file;
