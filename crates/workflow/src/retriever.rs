use std::sync::Arc;

use async_trait::async_trait;
use db::VectorIndex;
use docagent_core::RetrievedDocument;
use embedding::Embedder;
use tracing::debug;

use crate::SearchError;

/// Nearest-document lookup for a query string
#[async_trait]
pub trait Search: Send + Sync {
  async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>, SearchError>;
}

/// Embeds the query and asks the vector index for the closest `top_k` chunks
pub struct Retriever {
  embedder: Embedder,
  index: Arc<dyn VectorIndex>,
  top_k: usize,
}

impl Retriever {
  pub fn new(embedder: Embedder, index: Arc<dyn VectorIndex>) -> Self {
    Self {
      embedder,
      index,
      top_k: 5,
    }
  }

  pub fn with_top_k(mut self, top_k: usize) -> Self {
    self.top_k = top_k;
    self
  }

  pub fn top_k(&self) -> usize {
    self.top_k
  }
}

#[async_trait]
impl Search for Retriever {
  #[tracing::instrument(level = "debug", skip(self, query), fields(top_k = self.top_k))]
  async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>, SearchError> {
    let vector = self.embedder.embed_query(query).await?;
    let hits = self.index.query_similar(&vector, self.top_k).await?;
    debug!(hits = hits.len(), "Retrieved documents");
    Ok(hits)
  }
}
