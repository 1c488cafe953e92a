//! Prompt construction and the answer-length critic.

use std::fmt::Write;

/// Answer used when retrieval found nothing; generation is skipped
pub const NO_DOCUMENTS_MESSAGE: &str = "No documents found matching the query.";

/// Answers shorter than this (in characters) get [`CRITIQUE_SUFFIX`] appended
pub const MIN_ANSWER_CHARS: usize = 50;

pub const CRITIQUE_SUFFIX: &str =
  "\n\n(Note: result short; consider rephrasing your query or indexing more documents.)";

/// Grounding prompt quoting the user's query, followed by every document under a numbered heading
pub fn build_prompt(query: &str, docs: &[String]) -> String {
  let mut prompt = format!(
    "The user asked: {:?}.\n\nSummarize the following documents in the context of this query:\n\n",
    query
  );
  for (i, doc) in docs.iter().enumerate() {
    let _ = write!(prompt, "Document {}:\n{}\n\n", i + 1, doc);
  }
  prompt
}

/// Length-only heuristic. Not a quality gate.
pub fn critique(answer: &str) -> String {
  if answer.chars().count() < MIN_ANSWER_CHARS {
    format!("{answer}{CRITIQUE_SUFFIX}")
  } else {
    answer.to_string()
  }
}
