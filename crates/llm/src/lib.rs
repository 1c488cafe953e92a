//! Streaming text generation.
//!
//! A provider turns an [`InferenceRequest`] into a [`FragmentStream`]: the
//! incremental pieces of the answer, ending at the backend's completion flag.

use docagent_core::GenerationConfig;

mod ollama;
mod provider;
mod stream;

pub use ollama::OllamaGenerator;
pub use provider::{LlmProvider, Result};
pub use stream::{ByteStream, Fragment, FragmentStream};

/// One generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
  pub prompt: String,
  pub model: String,
  /// Whole-request deadline, response stream included
  pub timeout_secs: u64,
}

impl InferenceRequest {
  pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
    Self {
      prompt: prompt.into(),
      model: model.into(),
      timeout_secs: 300,
    }
  }

  pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
    self.timeout_secs = timeout_secs;
    self
  }
}

/// Errors that can occur during generation
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
  #[error("generation request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("generation backend returned {status}: {body}")]
  Status { status: u16, body: String },
  #[error("generation backend reported an error: {0}")]
  Backend(String),
  #[error("decoding generation response: {source} (line: {line})")]
  Decode {
    line: String,
    #[source]
    source: serde_json::Error,
  },
  #[error("request timed out after {0} seconds")]
  Timeout(u64),
  #[error("generation cancelled")]
  Cancelled,
}

/// Create the generation provider described by `config`
pub fn create_provider(config: &GenerationConfig) -> Box<dyn LlmProvider> {
  Box::new(OllamaGenerator::new().with_url(&config.ollama_url))
}
