use serde::Deserialize;
use tracing::warn;

use super::items_json;
use crate::gemini::structured::parse_json;
use crate::gemini::{LanguageModel, ResponseMode};
use crate::kb::CandidateItem;
use crate::planner::Domain;
use crate::planner::capability::{CapabilityError, QualityVerdict, RerankOutcome, Reranker};

#[derive(Deserialize)]
struct RerankReply {
    #[serde(default)]
    reranked: Vec<RatingReply>,
    high_quality: Vec<String>,
    feedback: String,
}

#[derive(Deserialize)]
struct RatingReply {
    title: String,
    relevance_score: f64,
    #[serde(default)]
    reason: String,
}

pub struct LlmReranker<M> {
    model: M,
    system: String,
    domain: Domain,
}

impl<M: LanguageModel> LlmReranker<M> {
    pub fn new(model: M, system: impl Into<String>, domain: Domain) -> Self {
        Self {
            model,
            system: system.into(),
            domain,
        }
    }
}

impl<M: LanguageModel> Reranker for LlmReranker<M> {
    async fn rerank(
        &self,
        goal: &str,
        expanded_query: &str,
        candidates: &[CandidateItem],
        accepted: &[CandidateItem],
    ) -> Result<RerankOutcome, CapabilityError> {
        let input = format!(
            "User goal: {goal}\n\n\
             Expanded query: {expanded_query}\n\n\
             Current {noun} candidates:\n{current}\n\n\
             Top picks so far:\n{picks}",
            noun = self.domain.item_noun(),
            current = items_json(candidates),
            picks = items_json(accepted),
        );

        let reply = self
            .model
            .generate(&self.system, &input, ResponseMode::Json)
            .await?;
        let parsed: RerankReply = parse_json(&reply)
            .map_err(|e| CapabilityError::Malformed(format!("rerank result: {e}")))?;

        Ok(RerankOutcome {
            verdicts: parsed.reranked.into_iter().map(to_verdict).collect(),
            high_quality: parsed
                .high_quality
                .into_iter()
                .map(|t| t.trim().to_string())
                .collect(),
            feedback: parsed.feedback,
        })
    }
}

fn to_verdict(rating: RatingReply) -> QualityVerdict {
    let score = rating.relevance_score.clamp(0.0, 1.0);
    if score != rating.relevance_score {
        warn!(
            title = %rating.title,
            score = rating.relevance_score,
            "relevance score outside 0..=1, clamped"
        );
    }
    QualityVerdict {
        title: rating.title,
        score: score as f32,
        reason: rating.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::ScriptedModel;

    fn reranker(reply: &str) -> LlmReranker<ScriptedModel> {
        LlmReranker::new(ScriptedModel::replying(&[reply]), "rerank", Domain::Drills)
    }

    #[tokio::test]
    async fn parses_verdicts_keys_and_feedback() {
        let r = reranker(
            r#"{
                "reranked": [
                    {"title": "Breakout Drill", "relevance_score": 0.9, "reason": "on target"},
                    {"title": "Edge Work", "relevance_score": 0.3, "reason": "off topic"}
                ],
                "high_quality": ["Breakout Drill"],
                "feedback": "find regroup drills"
            }"#,
        );

        let outcome = r
            .rerank("breakouts", "breakout passing", &[CandidateItem::new("Breakout Drill")], &[])
            .await
            .unwrap();

        assert_eq!(outcome.high_quality, vec!["Breakout Drill"]);
        assert_eq!(outcome.feedback, "find regroup drills");
        assert_eq!(outcome.verdicts.len(), 2);
        assert_eq!(outcome.verdicts[1].reason, "off topic");
    }

    #[tokio::test]
    async fn input_carries_candidates_and_picks_so_far() {
        let r = reranker(r#"{"high_quality": [], "feedback": ""}"#);
        let candidates = [CandidateItem::new("Edge Work").with_tags("hockey_skills", &["edges"])];
        let accepted = [CandidateItem::new("Breakout Drill")];

        r.rerank("skating", "edge control", &candidates, &accepted)
            .await
            .unwrap();

        let input = r.model.last_input();
        assert!(input.starts_with("User goal: skating"));
        assert!(input.contains("Expanded query: edge control"));
        assert!(input.contains("Current drill candidates:"));
        assert!(input.contains("\"hockey_skills\""));
        let picks = input.split("Top picks so far:").nth(1).unwrap();
        assert!(picks.contains("Breakout Drill"));
    }

    #[tokio::test]
    async fn scores_are_clamped() {
        let r = reranker(
            r#"{"reranked": [{"title": "A", "relevance_score": 7.5}], "high_quality": [], "feedback": ""}"#,
        );
        let outcome = r.rerank("g", "q", &[], &[]).await.unwrap();
        assert_eq!(outcome.verdicts[0].score, 1.0);
        assert!(outcome.verdicts[0].reason.is_empty());
    }

    #[tokio::test]
    async fn missing_feedback_is_malformed() {
        let r = reranker(r#"{"high_quality": ["A"]}"#);
        let err = r.rerank("g", "q", &[], &[]).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Malformed(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn fenced_reply_is_accepted() {
        let r = reranker("```json\n{\"high_quality\": [\" A \"], \"feedback\": \"\"}\n```");
        let outcome = r.rerank("g", "q", &[], &[]).await.unwrap();
        assert_eq!(outcome.high_quality, vec!["A"]);
    }
}
