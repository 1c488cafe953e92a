use async_trait::async_trait;
use docagent_core::{DocumentId, NewDocument, RetrievedDocument};

use crate::{DbError, Result};

/// Storage for (text, vector) pairs answering k-nearest-neighbour queries.
///
/// Every vector passed in, stored or used as a query, must have exactly
/// [`VectorIndex::dimensions`] components. Implementations reject anything
/// else and never pad or truncate.
#[async_trait]
pub trait VectorIndex: Send + Sync {
  /// Dimension every stored and query vector must have
  fn dimensions(&self) -> usize;

  /// Persist one chunk, returning the identifier assigned to it
  async fn insert(&self, doc: NewDocument) -> Result<DocumentId>;

  /// Up to `k` stored documents ordered by ascending distance to `vector`
  async fn query_similar(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedDocument>>;

  /// Number of stored documents
  async fn count(&self) -> Result<usize>;
}

/// Reject a vector whose length differs from the index dimension
pub fn check_dimensions(expected: usize, vector: &[f32]) -> Result<()> {
  if vector.len() != expected {
    return Err(DbError::DimensionMismatch {
      expected,
      actual: vector.len(),
    });
  }
  Ok(())
}
