//! Knowledge-base search over the drills and off-ice exercise MCP servers.

pub mod record;
#[cfg(test)]
pub(crate) mod testing;

pub use record::CandidateItem;

use std::time::Duration;

use rmcp::model::CallToolRequestParams;
use rmcp::service::RunningService;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::planner::capability::Searcher;

pub const DEFAULT_KB_URL: &str = "http://localhost:8000/mcp";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors returned by knowledge-base search.
#[derive(Debug, thiserror::Error)]
pub enum KbError {
    #[error("invalid knowledge-base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid knowledge-base URL: must be HTTP(S)")]
    InvalidScheme,

    #[error("knowledge base unreachable: {0}")]
    Connect(String),

    #[error("knowledge-base call failed: {0}")]
    Call(String),

    #[error("knowledge-base tool {tool} failed: {message}")]
    Tool { tool: String, message: String },

    #[error("knowledge base timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed knowledge-base response: {0}")]
    Decode(String),
}

/// MCP client session calling one search tool (`semantic_search_drills`,
/// `semantic_search_office`) with `{query, n_results}`.
///
/// Records are validated here; anything without a usable title is
/// quarantined and never reaches the planner.
pub struct McpKnowledgeBase {
    service: RunningService<RoleClient, ()>,
    tool: &'static str,
    n_results: u8,
}

impl McpKnowledgeBase {
    /// Opens a streamable-HTTP MCP session against `url` (e.g. `http://localhost:8000/mcp`).
    pub async fn connect(url: &str, tool: &'static str, n_results: u8) -> Result<Self, KbError> {
        let parsed = url::Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(KbError::InvalidScheme);
        }

        let transport = StreamableHttpClientTransport::from_uri(parsed.to_string());
        let service = tokio::time::timeout(CONNECT_TIMEOUT, ().serve(transport))
            .await
            .map_err(|_| KbError::Timeout(CONNECT_TIMEOUT))?
            .map_err(|e| KbError::Connect(e.to_string()))?;
        debug!(url = %parsed, tool, "knowledge-base session opened");

        Ok(Self::with_service(service, tool, n_results))
    }

    pub(crate) fn with_service(
        service: RunningService<RoleClient, ()>,
        tool: &'static str,
        n_results: u8,
    ) -> Self {
        Self {
            service,
            tool,
            n_results,
        }
    }

    pub fn tool(&self) -> &str {
        self.tool
    }

    /// Ends the MCP session.
    pub async fn close(self) {
        if let Err(e) = self.service.cancel().await {
            warn!(error = %e, "knowledge-base session did not shut down cleanly");
        }
    }
}

impl Searcher for McpKnowledgeBase {
    async fn search(&self, query: &str) -> Result<Vec<CandidateItem>, KbError> {
        let params: CallToolRequestParams = serde_json::from_value(json!({
            "name": self.tool,
            "arguments": {"query": query, "n_results": self.n_results},
        }))
        .map_err(|e| KbError::Decode(e.to_string()))?;

        let result = tokio::time::timeout(CALL_TIMEOUT, self.service.call_tool(params))
            .await
            .map_err(|_| KbError::Timeout(CALL_TIMEOUT))?
            .map_err(|e| KbError::Call(e.to_string()))?;

        let raw = serde_json::to_value(&result).map_err(|e| KbError::Decode(e.to_string()))?;
        let records = tool_records(self.tool, &raw)?;

        let (items, dropped) = record::parse_results(&records);
        debug!(
            tool = self.tool,
            returned = records.len(),
            accepted = items.len(),
            dropped,
            "knowledge-base search complete"
        );
        Ok(items)
    }
}

/// Pulls the raw records out of a serialized `CallToolResult`.
///
/// Structured content (a bare list, or `{"result": [...]}`) wins. Otherwise
/// every text block is parsed as JSON: a list contributes all its entries,
/// anything else contributes itself.
fn tool_records(tool: &str, result: &Value) -> Result<Vec<Value>, KbError> {
    let texts = || {
        result
            .get("content")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
    };

    if result.get("isError").and_then(Value::as_bool) == Some(true) {
        let message = texts().collect::<Vec<_>>().join("\n");
        return Err(KbError::Tool {
            tool: tool.to_string(),
            message,
        });
    }

    match result.get("structuredContent") {
        Some(Value::Array(records)) => return Ok(records.clone()),
        Some(Value::Object(map)) => {
            if let Some(Value::Array(records)) = map.get("result") {
                return Ok(records.clone());
            }
        }
        _ => {}
    }

    let mut records = Vec::new();
    for text in texts() {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| KbError::Decode(format!("tool {tool} returned non-JSON text: {e}")))?;
        match value {
            Value::Array(entries) => records.extend(entries),
            other => records.push(other),
        }
    }
    Ok(records)
}
