pub mod embedder;
pub mod ollama;
pub mod provider;
pub mod resilient;

pub use embedder::{EmbedError, Embedder};
pub use ollama::OllamaProvider;
pub use provider::{EmbeddingError, EmbeddingProvider};
pub use resilient::{ResilientProvider, RetryPolicy};
