//! LLM provider trait for generation
//!
//! Different generation backends implement `LlmProvider`; the workflow only
//! ever sees the resulting fragment stream.

use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::{FragmentStream, InferenceRequest, LlmError};

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LlmError>;

#[async_trait]
pub trait LlmProvider: Send + Sync + DynClone {
  /// The name of this provider (for logging/identification)
  fn name(&self) -> &str;

  /// Submit `request` and return the stream of answer fragments.
  ///
  /// Errors here cover the request itself (unreachable backend, non-success
  /// status); errors while reading the answer surface from the stream.
  async fn generate(&self, request: InferenceRequest) -> Result<FragmentStream>;
}

dyn_clone::clone_trait_object!(LlmProvider);
