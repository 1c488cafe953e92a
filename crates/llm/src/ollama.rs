use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{FragmentStream, InferenceRequest, LlmError, LlmProvider, Result};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Streaming generation against an Ollama server's `/api/generate`
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
  client: reqwest::Client,
  base_url: String,
}

impl Default for OllamaGenerator {
  fn default() -> Self {
    Self::new()
  }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  model: &'a str,
  prompt: &'a str,
}

impl OllamaGenerator {
  pub fn new() -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: DEFAULT_OLLAMA_URL.to_string(),
    }
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.base_url = url.into().trim_end_matches('/').to_string();
    self
  }

  fn generate_url(&self) -> String {
    format!("{}/api/generate", self.base_url)
  }
}

fn transport_error(e: reqwest::Error, timeout_secs: u64) -> LlmError {
  if e.is_timeout() {
    LlmError::Timeout(timeout_secs)
  } else {
    LlmError::Request(e)
  }
}

#[async_trait]
impl LlmProvider for OllamaGenerator {
  fn name(&self) -> &str {
    "ollama"
  }

  async fn generate(&self, request: InferenceRequest) -> Result<FragmentStream> {
    let timeout_secs = request.timeout_secs;
    debug!(
      model = %request.model,
      prompt_chars = request.prompt.chars().count(),
      "Submitting generation request"
    );

    let response = self
      .client
      .post(self.generate_url())
      .timeout(Duration::from_secs(timeout_secs))
      .json(&GenerateRequest {
        model: &request.model,
        prompt: &request.prompt,
      })
      .send()
      .await
      .map_err(|e| transport_error(e, timeout_secs))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      warn!(status = status.as_u16(), body = %body, "Generation request rejected");
      return Err(LlmError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let body = response
      .bytes_stream()
      .map(move |chunk| chunk.map(|b| b.to_vec()).map_err(|e| transport_error(e, timeout_secs)));
    Ok(FragmentStream::new(Box::pin(body)))
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;
  use tokio_util::sync::CancellationToken;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
  };

  use super::*;

  const NDJSON: &str = concat!(
    "{\"model\":\"llama3\",\"response\":\"The \",\"done\":false}\n",
    "{\"model\":\"llama3\",\"response\":\"answer\",\"done\":false}\n",
    "{\"model\":\"llama3\",\"response\":\".\",\"done\":true,\"total_duration\":12}\n",
  );

  #[tokio::test]
  async fn test_streams_answer_fragments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate"))
      .and(body_json(serde_json::json!({"model": "llama3", "prompt": "hi"})))
      .respond_with(ResponseTemplate::new(200).set_body_string(NDJSON))
      .expect(1)
      .mount(&server)
      .await;

    let generator = OllamaGenerator::new().with_url(format!("{}/", server.uri()));
    let stream = generator
      .generate(InferenceRequest::new("hi", "llama3").with_timeout(10))
      .await
      .unwrap();
    let text = stream.collect_text(&CancellationToken::new()).await.unwrap();
    assert_eq!(text, "The answer.");
  }

  #[tokio::test]
  async fn test_non_success_status_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate"))
      .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
      .mount(&server)
      .await;

    let generator = OllamaGenerator::new().with_url(server.uri());
    match generator.generate(InferenceRequest::new("hi", "missing")).await {
      Err(LlmError::Status { status, body }) => {
        assert_eq!(status, 404);
        assert_eq!(body, "model not found");
      }
      Err(other) => panic!("expected status error, got {:?}", other),
      Ok(_) => panic!("expected status error"),
    }
  }

  #[tokio::test]
  async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/generate"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_string(NDJSON)
          .set_delay(Duration::from_secs(3)),
      )
      .mount(&server)
      .await;

    let generator = OllamaGenerator::new().with_url(server.uri());
    let result = generator
      .generate(InferenceRequest::new("hi", "llama3").with_timeout(1))
      .await;
    assert!(matches!(result, Err(LlmError::Timeout(1))));
  }

  #[tokio::test]
  async fn test_unreachable_backend() {
    let generator = OllamaGenerator::new().with_url("http://127.0.0.1:1");
    let result = generator.generate(InferenceRequest::new("hi", "llama3")).await;
    assert!(matches!(result, Err(LlmError::Request(_))));
  }

  #[test]
  fn test_trailing_slash_trimmed() {
    let generator = OllamaGenerator::new().with_url("http://host:11434//");
    assert_eq!(generator.generate_url(), "http://host:11434/api/generate");
  }
}
