//! LLM-backed implementations of the planner capabilities.

mod expand;
pub mod prompts;
mod rerank;
mod summarize;

pub use expand::LlmQueryExpander;
pub use prompts::{PromptError, PromptSet};
pub use rerank::LlmReranker;
pub use summarize::LlmSummarizer;

use crate::kb::CandidateItem;

fn items_json(items: &[CandidateItem]) -> String {
    serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
}
