//! CLI command implementations

mod config;
mod index;
mod query;

use std::sync::Arc;

use anyhow::{Context, Result};
use db::{LanceIndex, VectorIndex};
use docagent_core::Config;
use embedding::Embedder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use config::{cmd_config_init, cmd_config_show};
pub use index::cmd_index;
pub use query::cmd_query;

/// Open the configured LanceDB table
async fn open_index(config: &Config) -> Result<Arc<dyn VectorIndex>> {
  let path = config.index.resolved_path();
  debug!(path = %path.display(), table = %config.index.table, "Opening vector index");
  let index = LanceIndex::open(&path, &config.index.table, config.embedding.dimensions)
    .await
    .with_context(|| format!("Failed to open vector index at {}", path.display()))?;
  Ok(Arc::new(index))
}

/// Build the configured embedder, warning when its backend does not answer
async fn embedder(config: &Config) -> Embedder {
  let embedder = Embedder::from_config(&config.embedding);
  if !embedder.provider().is_available().await {
    warn!(url = %config.embedding.ollama_url, "Embedding backend not reachable, requests will likely fail");
  }
  embedder
}

/// Token cancelled on the first Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
  let cancel = CancellationToken::new();
  let token = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("Interrupted, finishing in-flight work");
      token.cancel();
    }
  });
  cancel
}
