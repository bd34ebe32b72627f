//! In-process MCP knowledge-base server for tests, served over a tokio duplex pipe.

use std::sync::{Arc, Mutex};

use rmcp::handler::server::{router::tool::ToolRouter, wrapper::Parameters};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::McpKnowledgeBase;

/// `(tool, query, n_results)` for every call the server received.
pub type Calls = Arc<Mutex<Vec<(String, String, u8)>>>;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default = "default_n_results")]
    pub n_results: u8,
}

fn default_n_results() -> u8 {
    5
}

/// Serves both search tools; answers one text block per record like FastMCP does.
#[derive(Clone)]
pub struct StubKnowledgeServer {
    records: Arc<Vec<Value>>,
    failure: Option<String>,
    calls: Calls,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl StubKnowledgeServer {
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            records: Arc::new(records),
            failure: None,
            calls: Arc::default(),
            tool_router: Self::tool_router(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::with_records(vec![])
        }
    }

    pub fn queries(&self) -> Calls {
        Arc::clone(&self.calls)
    }

    #[tool(description = "Search for drills using semantic similarity")]
    async fn semantic_search_drills(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.answer("semantic_search_drills", args))
    }

    #[tool(description = "Semantic search over off-ice training entries")]
    async fn semantic_search_office(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.answer("semantic_search_office", args))
    }
}

impl StubKnowledgeServer {
    fn answer(&self, tool: &str, args: SearchArgs) -> CallToolResult {
        self.calls
            .lock()
            .unwrap()
            .push((tool.to_string(), args.query, args.n_results));
        match &self.failure {
            Some(message) => CallToolResult::error(vec![Content::text(message.clone())]),
            None => CallToolResult::success(
                self.records
                    .iter()
                    .map(|r| Content::text(r.to_string()))
                    .collect(),
            ),
        }
    }
}

#[tool_handler]
impl ServerHandler for StubKnowledgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Starts `server` on one end of a duplex pipe and opens a client session on the other.
pub async fn connect_stub(
    server: StubKnowledgeServer,
    tool: &'static str,
    n_results: u8,
) -> McpKnowledgeBase {
    let (server_io, client_io) = tokio::io::duplex(64 * 1024);
    tokio::spawn(async move {
        if let Ok(running) = server.serve(server_io).await {
            let _ = running.waiting().await;
        }
    });
    let service = ().serve(client_io).await.unwrap();
    McpKnowledgeBase::with_service(service, tool, n_results)
}
