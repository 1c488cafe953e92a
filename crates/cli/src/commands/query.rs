use std::sync::Arc;

use anyhow::Result;
use docagent_core::Config;
use tracing::debug;
use workflow::{Answer, Retriever, Workflow, WorkflowState};

use super::{cancel_on_ctrl_c, embedder, open_index};

/// Run the answer workflow for `query` and print the result
pub async fn cmd_query(config: &Config, query: &str, top_k: Option<usize>, json: bool) -> Result<()> {
  let top_k = top_k.unwrap_or(config.retrieval.top_k);
  if top_k == 0 {
    anyhow::bail!("--top-k must be at least 1");
  }

  let retriever = Retriever::new(embedder(config).await, open_index(config).await?).with_top_k(top_k);
  let workflow = Workflow::from_config(&config.generation);
  let mut state = WorkflowState::new(query, Arc::new(retriever));

  debug!(top_k, model = %config.generation.model, "Running query");
  let answer = workflow.run(&mut state, &cancel_on_ctrl_c()).await?;

  print_answer(&answer, json)
}

fn print_answer(answer: &Answer, json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(answer)?);
  } else {
    println!("Answer: {}", answer.text);
  }
  Ok(())
}
