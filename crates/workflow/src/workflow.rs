use std::{fmt, sync::Arc};

use docagent_core::GenerationConfig;
use llm::{InferenceRequest, LlmError, LlmProvider};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{NO_DOCUMENTS_MESSAGE, Search, StageError, WorkflowError, build_prompt, critique};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Retrieve,
  Summarize,
  Critique,
  Finalize,
}

impl Stage {
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Retrieve => "retrieve",
      Stage::Summarize => "summarize",
      Stage::Critique => "critique",
      Stage::Finalize => "finalize",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Execution order of every run
pub const STAGES: [Stage; 4] = [Stage::Retrieve, Stage::Summarize, Stage::Critique, Stage::Finalize];

/// Context threaded through the stages of one query.
///
/// Each stage mutates it in place before handing it to the next.
pub struct WorkflowState {
  pub query: String,
  /// Rendered hits; `None` until retrieval has run
  pub docs: Option<Vec<String>>,
  /// Filenames of the hits, closest first, without repeats
  pub sources: Vec<String>,
  pub answer: String,
  pub search: Arc<dyn Search>,
}

impl WorkflowState {
  pub fn new(query: impl Into<String>, search: Arc<dyn Search>) -> Self {
    Self {
      query: query.into(),
      docs: None,
      sources: Vec::new(),
      answer: String::new(),
      search,
    }
  }
}

/// The finished result handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
  #[serde(rename = "answer")]
  pub text: String,
  pub sources: Vec<String>,
}

/// Runs [`STAGES`] against a generation backend
pub struct Workflow {
  llm: Box<dyn LlmProvider>,
  model: String,
  timeout_secs: u64,
}

impl Workflow {
  pub fn new(llm: Box<dyn LlmProvider>, model: impl Into<String>) -> Self {
    Self {
      llm,
      model: model.into(),
      timeout_secs: 300,
    }
  }

  pub fn from_config(config: &GenerationConfig) -> Self {
    Self::new(llm::create_provider(config), &config.model).with_timeout(config.timeout_secs)
  }

  pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
    self.timeout_secs = timeout_secs;
    self
  }

  /// Run every stage in order, stopping at the first failure
  #[tracing::instrument(level = "debug", skip_all, fields(model = %self.model))]
  pub async fn run(&self, state: &mut WorkflowState, cancel: &CancellationToken) -> Result<Answer, WorkflowError> {
    for stage in STAGES {
      if cancel.is_cancelled() {
        return Err(WorkflowError {
          stage,
          source: StageError::Cancelled,
        });
      }
      debug!(stage = %stage, "Running stage");
      self
        .run_stage(stage, state, cancel)
        .await
        .map_err(|source| WorkflowError { stage, source })?;
    }

    Ok(Answer {
      text: std::mem::take(&mut state.answer),
      sources: std::mem::take(&mut state.sources),
    })
  }

  async fn run_stage(&self, stage: Stage, state: &mut WorkflowState, cancel: &CancellationToken) -> Result<(), StageError> {
    match stage {
      Stage::Retrieve => retrieve(state).await,
      Stage::Summarize => self.summarize(state, cancel).await,
      Stage::Critique => {
        state.answer = critique(&state.answer);
        Ok(())
      }
      Stage::Finalize => {
        info!(
          chars = state.answer.chars().count(),
          sources = state.sources.len(),
          "Answer ready"
        );
        Ok(())
      }
    }
  }

  async fn summarize(&self, state: &mut WorkflowState, cancel: &CancellationToken) -> Result<(), StageError> {
    let docs = match state.docs.as_deref() {
      Some(docs) if !docs.is_empty() => docs,
      _ => {
        debug!("No documents retrieved, skipping generation");
        state.answer = NO_DOCUMENTS_MESSAGE.to_string();
        return Ok(());
      }
    };

    let prompt = build_prompt(&state.query, docs);
    let request = InferenceRequest::new(prompt, &self.model).with_timeout(self.timeout_secs);
    debug!(provider = self.llm.name(), docs = docs.len(), "Requesting summary");

    let stream = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(LlmError::Cancelled.into()),
      stream = self.llm.generate(request) => stream?,
    };
    state.answer = stream.collect_text(cancel).await?;
    Ok(())
  }
}

async fn retrieve(state: &mut WorkflowState) -> Result<(), StageError> {
  let hits = state.search.search(&state.query).await?;

  let mut sources: Vec<String> = Vec::new();
  for hit in &hits {
    if !sources.contains(&hit.filename) {
      sources.push(hit.filename.clone());
    }
  }

  state.docs = Some(hits.iter().map(|h| h.render()).collect());
  state.sources = sources;
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use async_trait::async_trait;
  use db::DbError;
  use docagent_core::{DocumentId, RetrievedDocument, SourceTag};
  use futures::stream;
  use llm::FragmentStream;
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::{CRITIQUE_SUFFIX, SearchError};

  fn hit(filename: &str, content: &str) -> RetrievedDocument {
    RetrievedDocument {
      id: DocumentId::new(),
      filename: filename.to_string(),
      source: SourceTag::default(),
      content: content.to_string(),
      distance: 0.0,
    }
  }

  struct StaticSearch {
    hits: Vec<RetrievedDocument>,
    calls: AtomicUsize,
  }

  impl StaticSearch {
    fn new(hits: Vec<RetrievedDocument>) -> Arc<Self> {
      Arc::new(Self {
        hits,
        calls: AtomicUsize::new(0),
      })
    }
  }

  #[async_trait]
  impl Search for StaticSearch {
    async fn search(&self, _query: &str) -> Result<Vec<RetrievedDocument>, SearchError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self.hits.clone())
    }
  }

  struct FailingSearch;

  #[async_trait]
  impl Search for FailingSearch {
    async fn search(&self, _query: &str) -> Result<Vec<RetrievedDocument>, SearchError> {
      Err(SearchError::Index(DbError::NotFound("documents".into())))
    }
  }

  /// Replies with `body` as NDJSON and records every prompt it receives
  #[derive(Clone)]
  struct ScriptedLlm {
    body: String,
    prompts: Arc<Mutex<Vec<String>>>,
  }

  impl ScriptedLlm {
    fn answering(fragments: &[&str]) -> Self {
      let mut body = String::new();
      for (i, f) in fragments.iter().enumerate() {
        let done = i + 1 == fragments.len();
        body.push_str(&format!("{{\"response\":{:?},\"done\":{}}}\n", f, done));
      }
      Self::raw(body)
    }

    fn raw(body: impl Into<String>) -> Self {
      Self {
        body: body.into(),
        prompts: Arc::new(Mutex::new(Vec::new())),
      }
    }

    fn prompts(&self) -> Vec<String> {
      self.prompts.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
      "scripted"
    }

    async fn generate(&self, request: InferenceRequest) -> llm::Result<FragmentStream> {
      self.prompts.lock().unwrap().push(request.prompt);
      let body = self.body.clone().into_bytes();
      Ok(FragmentStream::from_stream(stream::iter(vec![Ok::<_, LlmError>(body)])))
    }
  }

  fn workflow(llm: &ScriptedLlm) -> Workflow {
    Workflow::new(Box::new(llm.clone()), "llama3")
  }

  #[tokio::test]
  async fn test_no_documents_skips_generation() {
    let llm = ScriptedLlm::answering(&["should not be used"]);
    let mut state = WorkflowState::new("anything", StaticSearch::new(vec![]));

    let answer = workflow(&llm).run(&mut state, &CancellationToken::new()).await.unwrap();

    assert!(llm.prompts().is_empty());
    assert_eq!(state.docs, Some(vec![]));
    // The fixed message is itself under the length threshold
    assert_eq!(answer.text, format!("{NO_DOCUMENTS_MESSAGE}{CRITIQUE_SUFFIX}"));
    assert!(answer.sources.is_empty());
  }

  #[tokio::test]
  async fn test_short_answer_suffixed_once() {
    let llm = ScriptedLlm::answering(&["Rust ", "is safe."]);
    let search = StaticSearch::new(vec![hit("notes.txt", "Rust is memory safe.")]);
    let mut state = WorkflowState::new("is rust safe?", search.clone());

    let answer = workflow(&llm).run(&mut state, &CancellationToken::new()).await.unwrap();

    assert_eq!(answer.text, format!("Rust is safe.{CRITIQUE_SUFFIX}"));
    assert_eq!(answer.sources, vec!["notes.txt"]);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_long_answer_unchanged() {
    let long = "Ownership and borrowing let Rust guarantee memory safety without a collector.";
    let llm = ScriptedLlm::answering(&[long]);
    let mut state = WorkflowState::new("q", StaticSearch::new(vec![hit("a.md", "text")]));

    let answer = workflow(&llm).run(&mut state, &CancellationToken::new()).await.unwrap();
    assert_eq!(answer.text, long);
  }

  #[tokio::test]
  async fn test_prompt_numbers_rendered_hits() {
    let llm = ScriptedLlm::answering(&["ok"]);
    let search = StaticSearch::new(vec![hit("a.txt", "first"), hit("b.txt", "second"), hit("a.txt", "third")]);
    let mut state = WorkflowState::new("summarize", search);

    let answer = workflow(&llm).run(&mut state, &CancellationToken::new()).await.unwrap();

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Document 1:\nFile: a.txt\nfirst\n\n"));
    assert!(prompts[0].contains("Document 2:\nFile: b.txt\nsecond\n\n"));
    assert!(prompts[0].contains("Document 3:\nFile: a.txt\nthird\n\n"));
    assert_eq!(answer.sources, vec!["a.txt", "b.txt"]);
  }

  #[tokio::test]
  async fn test_retrieve_failure_stops_workflow() {
    let llm = ScriptedLlm::answering(&["unused"]);
    let mut state = WorkflowState::new("q", Arc::new(FailingSearch));

    let err = workflow(&llm).run(&mut state, &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.stage, Stage::Retrieve);
    assert!(matches!(err.source, StageError::Search(SearchError::Index(DbError::NotFound(_)))));
    assert!(llm.prompts().is_empty());
    assert!(state.answer.is_empty());
    assert_eq!(state.docs, None);
  }

  #[tokio::test]
  async fn test_decode_failure_is_summarize_error() {
    let llm = ScriptedLlm::raw("{\"response\":\"partial\",\"done\":false}\ngarbage\n");
    let mut state = WorkflowState::new("q", StaticSearch::new(vec![hit("a.md", "text")]));

    let err = workflow(&llm).run(&mut state, &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.stage, Stage::Summarize);
    assert!(matches!(err.source, StageError::Generation(LlmError::Decode { .. })));
    // No partial answer leaks out
    assert!(state.answer.is_empty());
  }

  #[tokio::test]
  async fn test_cancelled_before_start() {
    let llm = ScriptedLlm::answering(&["unused"]);
    let search = StaticSearch::new(vec![hit("a.md", "text")]);
    let mut state = WorkflowState::new("q", search.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = workflow(&llm).run(&mut state, &cancel).await.unwrap_err();
    assert_eq!(err.stage, Stage::Retrieve);
    assert!(matches!(err.source, StageError::Cancelled));
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn test_stage_order_and_names() {
    let names: Vec<String> = STAGES.iter().map(|s| s.to_string()).collect();
    assert_eq!(names, vec!["retrieve", "summarize", "critique", "finalize"]);
  }

  #[test]
  fn test_error_names_stage() {
    let err = WorkflowError {
      stage: Stage::Summarize,
      source: StageError::Generation(LlmError::Timeout(30)),
    };
    assert_eq!(err.to_string(), "summarize stage failed: request timed out after 30 seconds");
  }
}
