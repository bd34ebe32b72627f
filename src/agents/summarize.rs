use super::items_json;
use crate::gemini::{LanguageModel, ResponseMode};
use crate::kb::CandidateItem;
use crate::planner::Domain;
use crate::planner::capability::{CapabilityError, Summarizer};

pub struct LlmSummarizer<M> {
    model: M,
    system: String,
    domain: Domain,
}

impl<M: LanguageModel> LlmSummarizer<M> {
    pub fn new(model: M, system: impl Into<String>, domain: Domain) -> Self {
        Self {
            model,
            system: system.into(),
            domain,
        }
    }
}

impl<M: LanguageModel> Summarizer for LlmSummarizer<M> {
    async fn summarize(
        &self,
        goal: &str,
        expanded_query: &str,
        candidates: &[CandidateItem],
    ) -> Result<String, CapabilityError> {
        let input = format!(
            "User goal: {goal}\n\n\
             Expanded query: {expanded_query}\n\n\
             {noun}s:\n{items}",
            noun = capitalize(self.domain.item_noun()),
            items = items_json(candidates),
        );

        let reply = self
            .model
            .generate(&self.system, &input, ResponseMode::Text)
            .await?;
        let summary = reply.trim();
        if summary.is_empty() {
            return Err(CapabilityError::Malformed("summary is empty".to_string()));
        }
        Ok(summary.to_string())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
