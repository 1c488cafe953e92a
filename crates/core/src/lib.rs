pub mod config;
pub mod document;
pub mod error;

pub use config::{
  ChunkingConfig, Config, EmbeddingConfig, GenerationConfig, IndexConfig, IngestConfig, LogConfig, OcrConfig,
  RetrievalConfig,
};
pub use document::{
  DEFAULT_SOURCE_TAG, DocumentId, NewDocument, RetrievedDocument, SourceFile, SourceTag, StoredDocument, TextChunk,
};
pub use error::{Error, Result};
