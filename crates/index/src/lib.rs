mod chunker;
mod ingest;
mod scanner;

use std::path::PathBuf;

pub use chunker::{ChunkError, Chunker, ChunkerConfig};
pub use ingest::{FileOutcome, FileReport, IngestReport, Ingestor};
pub use scanner::{has_allowed_extension, scan_folder};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
  #[error("ingest root does not exist: {}", .0.display())]
  RootNotFound(PathBuf),
}
