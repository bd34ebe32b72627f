use std::collections::HashMap;

use tracing::{debug, info};

use super::capability::{
    CapabilityError, QueryExpander, Reranker, Searcher, Summarizer,
};
use crate::kb::{CandidateItem, KbError};

pub const DEFAULT_MAX_ITERATIONS: u32 = 5;
pub const DEFAULT_QUALITY_THRESHOLD: usize = 5;
pub const MAX_ITERATIONS_CAP: u32 = 20;

/// Bounds on the search/rerank loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPolicy {
    max_iterations: u32,
    quality_threshold: usize,
}

impl LoopPolicy {
    /// `max_iterations` is clamped to 1..=20, `quality_threshold` to at least 1.
    pub fn new(max_iterations: u32, quality_threshold: usize) -> Self {
        Self {
            max_iterations: max_iterations.clamp(1, MAX_ITERATIONS_CAP),
            quality_threshold: quality_threshold.max(1),
        }
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn quality_threshold(&self) -> usize {
        self.quality_threshold
    }
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS, DEFAULT_QUALITY_THRESHOLD)
    }
}

#[derive(Debug)]
pub struct RefineRequest<'a> {
    pub goal: &'a str,
    pub policy: LoopPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ThresholdReached,
    FeedbackExhausted,
    IterationCap,
}

#[derive(Debug)]
pub struct RefinementOutcome {
    pub expanded_query: String,
    /// Every candidate the reranker accepted, in acceptance order. Not deduplicated.
    pub results: Vec<CandidateItem>,
    /// Summary of the final search batch.
    pub summary: String,
    pub iterations: u32,
    pub stop: StopReason,
}

/// A failed stage aborts the run; no partial outcome is returned.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("goal must not be empty")]
    EmptyGoal,

    #[error("query expansion failed: {0}")]
    Expand(CapabilityError),

    #[error("search failed: {0}")]
    Search(KbError),

    #[error("reranking failed: {0}")]
    Rerank(CapabilityError),

    #[error("summarization failed: {0}")]
    Summarize(CapabilityError),
}

/// Expands the goal, then searches and reranks until enough candidates have
/// been accepted, the reranker stops giving feedback, or the iteration cap is
/// hit. The summary is written from the last raw search batch.
pub async fn refine(
    expander: &impl QueryExpander,
    searcher: &impl Searcher,
    reranker: &impl Reranker,
    summarizer: &impl Summarizer,
    request: &RefineRequest<'_>,
) -> Result<RefinementOutcome, PlanError> {
    if request.goal.trim().is_empty() {
        return Err(PlanError::EmptyGoal);
    }
    let goal = request.goal;
    let policy = request.policy;

    let expanded_query = expander.expand(goal).await.map_err(PlanError::Expand)?;
    info!(expanded_query = %expanded_query, "query expanded");

    let mut accepted: Vec<CandidateItem> = Vec::new();
    let mut feedback = String::new();
    let mut last_batch: Vec<CandidateItem> = Vec::new();
    let mut iterations = 0;
    let mut stop = StopReason::IterationCap;

    for iteration in 1..=policy.max_iterations() {
        iterations = iteration;

        let query = search_input(&expanded_query, &feedback);
        debug!(iteration, query = %query, "searching");
        let candidates = searcher.search(&query).await.map_err(PlanError::Search)?;

        let outcome = reranker
            .rerank(goal, &expanded_query, &candidates, &accepted)
            .await
            .map_err(PlanError::Rerank)?;
        for verdict in &outcome.verdicts {
            debug!(
                iteration,
                title = %verdict.title,
                score = verdict.score,
                reason = %verdict.reason,
                "verdict"
            );
        }

        // Only titles from this batch resolve; anything else is dropped.
        let added = {
            let lookup: HashMap<&str, &CandidateItem> = candidates
                .iter()
                .map(|c| (c.title.as_str(), c))
                .collect();
            let before = accepted.len();
            accepted.extend(
                outcome
                    .high_quality
                    .iter()
                    .filter_map(|title| lookup.get(title.as_str()).map(|c| (*c).clone())),
            );
            accepted.len() - before
        };
        let unresolved = outcome.high_quality.len() - added;
        if unresolved > 0 {
            debug!(iteration, unresolved, "reranker named titles not in this batch");
        }

        feedback = outcome.feedback;
        info!(
            iteration,
            candidates = candidates.len(),
            added,
            accepted = accepted.len(),
            has_feedback = !feedback.is_empty(),
            "search iteration complete"
        );
        last_batch = candidates;

        if accepted.len() >= policy.quality_threshold() {
            stop = StopReason::ThresholdReached;
            break;
        }
        if feedback.is_empty() {
            stop = StopReason::FeedbackExhausted;
            break;
        }
    }

    info!(iterations, stop = ?stop, accepted = accepted.len(), "refinement finished");

    let summary = summarizer
        .summarize(goal, &expanded_query, &last_batch)
        .await
        .map_err(PlanError::Summarize)?;

    Ok(RefinementOutcome {
        expanded_query,
        results: accepted,
        summary,
        iterations,
        stop,
    })
}

fn search_input(expanded_query: &str, feedback: &str) -> String {
    if feedback.is_empty() {
        expanded_query.to_string()
    } else {
        format!("{expanded_query} {feedback}")
    }
}
