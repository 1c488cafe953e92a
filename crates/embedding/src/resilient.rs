//! Opt-in retries for transient embedding failures.

use std::time::Duration;

use async_trait::async_trait;
use docagent_core::EmbeddingConfig;
use tracing::{debug, warn};

use crate::{EmbeddingError, EmbeddingProvider};

/// How many times, and how far apart, a failed request is re-sent
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
  pub max_retries: u32,
  pub base_delay: Duration,
  pub max_delay: Duration,
  /// Stretch each delay by a random 0-25%
  pub jitter: bool,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_retries: 2,
      base_delay: Duration::from_millis(500),
      max_delay: Duration::from_secs(5),
      jitter: true,
    }
  }
}

impl RetryPolicy {
  pub fn from_config(config: &EmbeddingConfig) -> Self {
    Self {
      max_retries: config.max_retries,
      ..Default::default()
    }
  }

  /// Delay before retry number `retry` (0-based): doubles each time, capped at `max_delay`
  pub fn delay(&self, retry: u32) -> Duration {
    let doubled = self.base_delay.saturating_mul(2u32.saturating_pow(retry));
    let capped = doubled.min(self.max_delay);
    if !self.jitter {
      return capped;
    }
    capped.mul_f64(1.0 + jitter_fraction() * 0.25).min(self.max_delay)
  }
}

/// Clock-derived value in [0, 1)
fn jitter_fraction() -> f64 {
  use std::time::{SystemTime, UNIX_EPOCH};

  let nanos = SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.subsec_nanos())
    .unwrap_or_default();
  f64::from(nanos) / 1_000_000_000.0
}

/// Wraps a provider, re-sending requests that failed transiently
pub struct ResilientProvider<P: EmbeddingProvider> {
  inner: P,
  policy: RetryPolicy,
}

impl<P: EmbeddingProvider> ResilientProvider<P> {
  pub fn new(inner: P, policy: RetryPolicy) -> Self {
    Self { inner, policy }
  }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for ResilientProvider<P> {
  fn name(&self) -> &str {
    self.inner.name()
  }

  fn model_id(&self) -> &str {
    self.inner.model_id()
  }

  fn dimensions(&self) -> usize {
    self.inner.dimensions()
  }

  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let mut retry = 0;
    loop {
      match self.inner.embed(text).await {
        Ok(vector) => return Ok(vector),
        Err(e) if e.is_retryable() && retry < self.policy.max_retries => {
          let delay = self.policy.delay(retry);
          retry += 1;
          warn!(retry, err = %e, ?delay, "Transient embedding failure, retrying");
          tokio::time::sleep(delay).await;
        }
        Err(e) => {
          if retry > 0 {
            debug!(retries = retry, "Giving up on embedding request");
          }
          return Err(e);
        }
      }
    }
  }

  async fn is_available(&self) -> bool {
    self.inner.is_available().await
  }
}
