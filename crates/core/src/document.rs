use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source tag applied when none is configured
pub const DEFAULT_SOURCE_TAG: &str = "local";

/// Backend-assigned identifier for a stored document (newtype for type safety)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
  pub fn new() -> Self {
    Self(Uuid::now_v7()) // Time-ordered UUIDs
  }
}

impl Default for DocumentId {
  fn default() -> Self {
    Self::new()
  }
}

impl std::fmt::Display for DocumentId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl std::str::FromStr for DocumentId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self(Uuid::parse_str(s)?))
  }
}

/// Where an ingested file came from (e.g. "local")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceTag(String);

impl SourceTag {
  pub fn new(tag: impl Into<String>) -> Self {
    Self(tag.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Default for SourceTag {
  fn default() -> Self {
    Self(DEFAULT_SOURCE_TAG.to_string())
  }
}

impl std::fmt::Display for SourceTag {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for SourceTag {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

/// A file queued for one ingestion pass. Never persisted itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
  pub path: PathBuf,
  pub source: SourceTag,
}

impl SourceFile {
  pub fn new(path: impl Into<PathBuf>, source: SourceTag) -> Self {
    Self {
      path: path.into(),
      source,
    }
  }

  pub fn local(path: impl Into<PathBuf>) -> Self {
    Self::new(path, SourceTag::default())
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Filename recorded on every stored chunk of this file
  pub fn filename(&self) -> String {
    self.path.to_string_lossy().to_string()
  }
}

/// A bounded, non-empty segment of a document's extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
  /// Position of this chunk within its document
  pub index: usize,
  pub content: String,
}

impl TextChunk {
  pub fn new(index: usize, content: impl Into<String>) -> Self {
    Self {
      index,
      content: content.into(),
    }
  }

  pub fn char_len(&self) -> usize {
    self.content.chars().count()
  }
}

/// Insert payload for the vector index
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
  pub filename: String,
  pub source: SourceTag,
  pub content: String,
  pub vector: Vec<f32>,
}

impl NewDocument {
  pub fn new(filename: impl Into<String>, source: SourceTag, content: impl Into<String>, vector: Vec<f32>) -> Self {
    Self {
      filename: filename.into(),
      source,
      content: content.into(),
      vector,
    }
  }
}

/// The persisted unit. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
  pub id: DocumentId,
  pub filename: String,
  pub source: SourceTag,
  pub content: String,
  pub vector: Vec<f32>,
  pub created_at: DateTime<Utc>,
}

impl StoredDocument {
  pub fn from_new(doc: NewDocument) -> Self {
    Self {
      id: DocumentId::new(),
      filename: doc.filename,
      source: doc.source,
      content: doc.content,
      vector: doc.vector,
      created_at: Utc::now(),
    }
  }
}

/// A similarity-query hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
  pub id: DocumentId,
  pub filename: String,
  pub source: SourceTag,
  pub content: String,
  /// Distance to the query vector (smaller is closer)
  pub distance: f32,
}

impl RetrievedDocument {
  /// Text handed to the summarizer for this hit
  pub fn render(&self) -> String {
    format!("File: {}\n{}", self.filename, self.content)
  }
}
