use serde::de::DeserializeOwned;
use tracing::warn;

use super::types::GenerateContentResponse;

/// Concatenates the text parts of the first candidate. `None` when the model
/// returned nothing usable (safety filter, empty candidate list).
pub fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.as_ref().and_then(|c| c.first());

    let text = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|p| p.text.as_str())
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty());

    if text.is_none() {
        let reason = candidate
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or("none");
        warn!(finish_reason = reason, "Gemini returned empty answer");
    }

    text
}

/// Decodes a JSON reply, tolerating a surrounding Markdown code fence.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fence(text))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
