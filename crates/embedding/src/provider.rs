use async_trait::async_trait;

/// A backend that maps one text to one vector per round trip
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  fn name(&self) -> &str;
  fn model_id(&self) -> &str;
  fn dimensions(&self) -> usize;

  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
  async fn is_available(&self) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
  #[error("Request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("Provider returned {status}: {body}")]
  Status { status: u16, body: String },
  #[error("Failed to decode response: {0}")]
  Decode(String),
  #[error("Network error: {0}")]
  Network(String),
  #[error("Request timed out")]
  Timeout,
}

impl EmbeddingError {
  /// Network failures, timeouts and 429/502/503/504 may succeed on a second attempt
  pub fn is_retryable(&self) -> bool {
    match self {
      EmbeddingError::Network(_) | EmbeddingError::Timeout => true,
      EmbeddingError::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
      _ => false,
    }
  }

  /// Classify a transport error so retry logic can see timeouts and connection failures
  pub fn from_transport(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      EmbeddingError::Timeout
    } else if err.is_connect() {
      EmbeddingError::Network(err.to_string())
    } else {
      EmbeddingError::Request(err)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn status(code: u16) -> EmbeddingError {
    EmbeddingError::Status {
      status: code,
      body: String::new(),
    }
  }

  #[test]
  fn test_transient_errors_are_retryable() {
    assert!(EmbeddingError::Network("connection reset".to_string()).is_retryable());
    assert!(EmbeddingError::Timeout.is_retryable());
    for code in [429, 502, 503, 504] {
      assert!(status(code).is_retryable(), "{code} should be retryable");
    }
  }

  #[test]
  fn test_permanent_errors_are_not_retryable() {
    assert!(!status(400).is_retryable());
    assert!(!status(404).is_retryable());
    assert!(!EmbeddingError::Decode("bad json".to_string()).is_retryable());
  }
}
