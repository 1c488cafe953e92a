use std::time::Duration;

use async_trait::async_trait;
use docagent_core::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{EmbeddingError, EmbeddingProvider};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "nomic-embed-text";
const DEFAULT_DIMENSIONS: usize = 768;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OllamaProvider {
  client: reqwest::Client,
  base_url: String,
  model: String,
  dimensions: usize,
  timeout: Duration,
}

impl Default for OllamaProvider {
  fn default() -> Self {
    Self::new()
  }
}

impl OllamaProvider {
  pub fn new() -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: DEFAULT_OLLAMA_URL.to_string(),
      model: DEFAULT_MODEL.to_string(),
      dimensions: DEFAULT_DIMENSIONS,
      timeout: DEFAULT_TIMEOUT,
    }
  }

  pub fn from_config(config: &EmbeddingConfig) -> Self {
    Self::new()
      .with_url(&config.ollama_url)
      .with_model(&config.model, config.dimensions)
      .with_timeout(Duration::from_secs(config.timeout_secs))
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.base_url = url.into().trim_end_matches('/').to_string();
    self
  }

  pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
    self.model = model.into();
    self.dimensions = dimensions;
    self
  }

  /// Deadline applied to each request independently
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  fn embeddings_url(&self) -> String {
    format!("{}/api/embeddings", self.base_url)
  }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
  embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
  fn name(&self) -> &str {
    "ollama"
  }

  fn model_id(&self) -> &str {
    &self.model
  }

  fn dimensions(&self) -> usize {
    self.dimensions
  }

  #[tracing::instrument(level = "trace", skip(self, text), fields(chars = text.len()))]
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let request = EmbeddingRequest {
      model: &self.model,
      prompt: text,
    };

    debug!(model = %self.model, chars = text.len(), "Embedding text with Ollama");

    let response = self
      .client
      .post(self.embeddings_url())
      .timeout(self.timeout)
      .json(&request)
      .send()
      .await
      .map_err(EmbeddingError::from_transport)?;

    let status = response.status();
    let body = response.text().await.map_err(EmbeddingError::from_transport)?;

    if !status.is_success() {
      warn!(status = status.as_u16(), body = %body, "Ollama embedding failed");
      return Err(EmbeddingError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let result: EmbeddingResponse = serde_json::from_str(&body).map_err(|e| EmbeddingError::Decode(e.to_string()))?;
    Ok(result.embedding)
  }

  async fn is_available(&self) -> bool {
    match self
      .client
      .get(&self.base_url)
      .timeout(Duration::from_secs(5))
      .send()
      .await
    {
      Ok(response) => response.status().is_success(),
      Err(_) => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
  };

  #[test]
  fn test_provider_defaults() {
    let provider = OllamaProvider::new();
    assert_eq!(provider.name(), "ollama");
    assert_eq!(provider.model_id(), DEFAULT_MODEL);
    assert_eq!(provider.dimensions(), DEFAULT_DIMENSIONS);
  }

  #[test]
  fn test_provider_customization() {
    let provider = OllamaProvider::new()
      .with_url("http://custom:8080/")
      .with_model("custom-model", 1024);

    assert_eq!(provider.base_url, "http://custom:8080");
    assert_eq!(provider.model_id(), "custom-model");
    assert_eq!(provider.dimensions(), 1024);
  }

  #[test]
  fn test_embeddings_url() {
    let provider = OllamaProvider::new();
    assert_eq!(provider.embeddings_url(), "http://localhost:11434/api/embeddings");
  }

  #[test]
  fn test_from_config() {
    let config = EmbeddingConfig {
      model: "mxbai-embed-large".to_string(),
      dimensions: 1024,
      timeout_secs: 5,
      ..Default::default()
    };
    let provider = OllamaProvider::from_config(&config);
    assert_eq!(provider.model_id(), "mxbai-embed-large");
    assert_eq!(provider.dimensions(), 1024);
    assert_eq!(provider.timeout, Duration::from_secs(5));
  }

  #[tokio::test]
  async fn test_embed_sends_model_and_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embeddings"))
      .and(body_json(serde_json::json!({ "model": "nomic-embed-text", "prompt": "hello" })))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "embedding": [0.5, 0.25, 1.0] })))
      .expect(1)
      .mount(&server)
      .await;

    let provider = OllamaProvider::new().with_url(server.uri());
    let vector = provider.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.5, 0.25, 1.0]);
  }

  #[tokio::test]
  async fn test_embed_non_success_surfaces_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embeddings"))
      .respond_with(ResponseTemplate::new(404).set_body_string("model \"nomic-embed-text\" not found"))
      .mount(&server)
      .await;

    let provider = OllamaProvider::new().with_url(server.uri());
    match provider.embed("hello").await {
      Err(EmbeddingError::Status { status, body }) => {
        assert_eq!(status, 404);
        assert!(body.contains("not found"));
      }
      other => panic!("expected status error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_embed_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embeddings"))
      .respond_with(ResponseTemplate::new(200).set_body_string("{\"embeddings\": []}"))
      .mount(&server)
      .await;

    let provider = OllamaProvider::new().with_url(server.uri());
    assert!(matches!(provider.embed("hello").await, Err(EmbeddingError::Decode(_))));
  }

  #[tokio::test]
  async fn test_embed_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embeddings"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!({ "embedding": [1.0] }))
          .set_delay(Duration::from_millis(500)),
      )
      .mount(&server)
      .await;

    let provider = OllamaProvider::new()
      .with_url(server.uri())
      .with_timeout(Duration::from_millis(50));
    assert!(matches!(provider.embed("hello").await, Err(EmbeddingError::Timeout)));
  }

  #[tokio::test]
  async fn test_unreachable_backend_is_unavailable() {
    let provider = OllamaProvider::new().with_url("http://127.0.0.1:9");
    assert!(!provider.is_available().await);
  }
}
