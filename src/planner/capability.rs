//! The four collaborators the refinement loop is built from.
//!
//! Each is a trait so the loop can run against the Gemini/HTTP
//! implementations in production and against scripted stubs in tests.

use crate::gemini::GeminiError;
use crate::kb::{CandidateItem, KbError};

/// Failure of an LLM-backed capability.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The model call itself failed (network, quota, API error).
    #[error("{0}")]
    Upstream(#[from] GeminiError),

    /// The model answered, but not in the shape the capability requires.
    #[error("malformed model output: {0}")]
    Malformed(String),
}

/// Per-candidate relevance judgement. Informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityVerdict {
    pub title: String,
    pub score: f32,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct RerankOutcome {
    pub verdicts: Vec<QualityVerdict>,
    /// Titles judged high quality, in the order the reranker listed them.
    pub high_quality: Vec<String>,
    /// Guidance for the next search; empty when the reranker is satisfied.
    pub feedback: String,
}

pub trait QueryExpander {
    async fn expand(&self, goal: &str) -> Result<String, CapabilityError>;
}

pub trait Searcher {
    /// An empty result is a valid answer, not an error.
    async fn search(&self, query: &str) -> Result<Vec<CandidateItem>, KbError>;
}

pub trait Reranker {
    /// `accepted` is the accumulator so far, passed as context only.
    async fn rerank(
        &self,
        goal: &str,
        expanded_query: &str,
        candidates: &[CandidateItem],
        accepted: &[CandidateItem],
    ) -> Result<RerankOutcome, CapabilityError>;
}

pub trait Summarizer {
    async fn summarize(
        &self,
        goal: &str,
        expanded_query: &str,
        candidates: &[CandidateItem],
    ) -> Result<String, CapabilityError>;
}
