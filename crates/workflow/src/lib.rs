//! Query answering: retrieve, summarize, critique, finalize.
//!
//! The four stages run in a fixed order over one [`WorkflowState`]. The first
//! failing stage ends the run and its error reaches the caller unchanged.

mod error;
mod retriever;
mod stages;
mod workflow;

pub use error::{SearchError, StageError, WorkflowError};
pub use retriever::{Retriever, Search};
pub use stages::{CRITIQUE_SUFFIX, MIN_ANSWER_CHARS, NO_DOCUMENTS_MESSAGE, build_prompt, critique};
pub use workflow::{Answer, STAGES, Stage, Workflow, WorkflowState};
