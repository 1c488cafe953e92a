use db::DbError;
use embedding::EmbedError;
use llm::LlmError;

use crate::Stage;

/// Failure looking up documents for a query
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
  #[error("embedding query: {0}")]
  Embed(#[from] EmbedError),
  #[error("querying index: {0}")]
  Index(#[from] DbError),
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
  #[error(transparent)]
  Search(#[from] SearchError),
  #[error(transparent)]
  Generation(#[from] LlmError),
  #[error("cancelled")]
  Cancelled,
}

/// The first stage failure of a run
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct WorkflowError {
  pub stage: Stage,
  #[source]
  pub source: StageError,
}
