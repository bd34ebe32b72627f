use serde::Deserialize;

use crate::gemini::structured::parse_json;
use crate::gemini::{LanguageModel, ResponseMode};
use crate::planner::capability::{CapabilityError, QueryExpander};

#[derive(Deserialize)]
struct ExpandedQuery {
    expanded_query: String,
}

pub struct LlmQueryExpander<M> {
    model: M,
    system: String,
}

impl<M: LanguageModel> LlmQueryExpander<M> {
    pub fn new(model: M, system: impl Into<String>) -> Self {
        Self {
            model,
            system: system.into(),
        }
    }
}

impl<M: LanguageModel> QueryExpander for LlmQueryExpander<M> {
    async fn expand(&self, goal: &str) -> Result<String, CapabilityError> {
        let reply = self
            .model
            .generate(&self.system, goal, ResponseMode::Json)
            .await?;
        let parsed: ExpandedQuery = parse_json(&reply)
            .map_err(|e| CapabilityError::Malformed(format!("expanded query: {e}")))?;

        let expanded = parsed.expanded_query.trim();
        if expanded.is_empty() {
            return Err(CapabilityError::Malformed(
                "expanded query is empty".to_string(),
            ));
        }
        Ok(expanded.to_string())
    }
}
