use std::cmp::Ordering;

use async_trait::async_trait;
use docagent_core::{DocumentId, NewDocument, RetrievedDocument, StoredDocument};
use tokio::sync::RwLock;
use tracing::trace;

use crate::{Result, VectorIndex, check_dimensions};

/// Process-local index with exact (brute force) L2 search
pub struct MemoryIndex {
  dimensions: usize,
  docs: RwLock<Vec<StoredDocument>>,
}

impl MemoryIndex {
  pub fn new(dimensions: usize) -> Self {
    Self {
      dimensions,
      docs: RwLock::new(Vec::new()),
    }
  }

  /// Snapshot of everything stored, in insertion order
  pub async fn documents(&self) -> Vec<StoredDocument> {
    self.docs.read().await.clone()
  }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait]
impl VectorIndex for MemoryIndex {
  fn dimensions(&self) -> usize {
    self.dimensions
  }

  async fn insert(&self, doc: NewDocument) -> Result<DocumentId> {
    check_dimensions(self.dimensions, &doc.vector)?;
    let stored = StoredDocument::from_new(doc);
    let id = stored.id;
    self.docs.write().await.push(stored);
    trace!(id = %id, "Stored document in memory index");
    Ok(id)
  }

  async fn query_similar(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
    check_dimensions(self.dimensions, vector)?;
    if k == 0 {
      return Ok(Vec::new());
    }

    let docs = self.docs.read().await;
    let mut scored: Vec<(f32, &StoredDocument)> = docs.iter().map(|d| (squared_l2(vector, &d.vector), d)).collect();
    // sort_by is stable: equal distances keep insertion order
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    Ok(
      scored
        .into_iter()
        .take(k)
        .map(|(distance, d)| RetrievedDocument {
          id: d.id,
          filename: d.filename.clone(),
          source: d.source.clone(),
          content: d.content.clone(),
          distance,
        })
        .collect(),
    )
  }

  async fn count(&self) -> Result<usize> {
    Ok(self.docs.read().await.len())
  }
}
