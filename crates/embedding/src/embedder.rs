//! Dimension-checked embedding of chunk batches and queries.

use std::sync::Arc;

use docagent_core::EmbeddingConfig;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, warn};

use crate::{EmbeddingError, EmbeddingProvider, OllamaProvider, ResilientProvider, RetryPolicy};

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
  #[error("empty query")]
  EmptyQuery,
  #[error(transparent)]
  Provider(#[from] EmbeddingError),
  #[error("expected embedding dim {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },
  /// A batch item failed; `index` is 0-based
  #[error("failed embedding chunk {index}: {source}")]
  Item {
    index: usize,
    #[source]
    source: Box<EmbedError>,
  },
}

impl EmbedError {
  /// Index of the failing batch item, if this came from a batch
  pub fn item_index(&self) -> Option<usize> {
    match self {
      EmbedError::Item { index, .. } => Some(*index),
      _ => None,
    }
  }
}

/// Maps texts to vectors of exactly `dimensions` length
#[derive(Clone)]
pub struct Embedder {
  provider: Arc<dyn EmbeddingProvider>,
  dimensions: usize,
  concurrency: usize,
}

impl Embedder {
  pub fn new(provider: Arc<dyn EmbeddingProvider>, dimensions: usize) -> Self {
    Self {
      provider,
      dimensions,
      concurrency: 1,
    }
  }

  /// Build the Ollama-backed embedder described by `config`
  pub fn from_config(config: &EmbeddingConfig) -> Self {
    let ollama = OllamaProvider::from_config(config);
    let provider: Arc<dyn EmbeddingProvider> = if config.max_retries > 0 {
      Arc::new(ResilientProvider::new(ollama, RetryPolicy::from_config(config)))
    } else {
      Arc::new(ollama)
    };

    Self::new(provider, config.dimensions).with_concurrency(config.concurrency)
  }

  /// Keep up to `n` requests in flight; results stay in input order
  pub fn with_concurrency(mut self, n: usize) -> Self {
    self.concurrency = n.max(1);
    self
  }

  pub fn dimensions(&self) -> usize {
    self.dimensions
  }

  pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
    &self.provider
  }

  /// Embed every text, one round trip each.
  ///
  /// The first failing item aborts the whole batch; pending requests are dropped.
  #[tracing::instrument(level = "debug", skip(self, texts), fields(batch_size = texts.len()))]
  pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    let vectors: Vec<Vec<f32>> = stream::iter(texts.iter().enumerate())
      .map(|(index, text)| async move {
        self.embed_one(text).await.map_err(|e| {
          warn!(index, err = %e, "Embedding failed");
          EmbedError::Item {
            index,
            source: Box::new(e),
          }
        })
      })
      .buffered(self.concurrency)
      .try_collect()
      .await?;

    debug!(vectors = vectors.len(), "Batch embedded");
    Ok(vectors)
  }

  /// Embed a retrieval query; blank queries are rejected
  pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
    if query.trim().is_empty() {
      return Err(EmbedError::EmptyQuery);
    }
    self.embed_one(query).await
  }

  async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
    let vector = self.provider.embed(text).await?;
    if vector.len() != self.dimensions {
      return Err(EmbedError::DimensionMismatch {
        expected: self.dimensions,
        actual: vector.len(),
      });
    }
    Ok(vector)
  }
}
