//! MCP server for ResearchBook: exposes person lookup, expert search and
//! database identification via the Model Context Protocol.

pub mod params;

use params::*;
use crate::book::ResearchBook;
use crate::config::Config;
use crate::graph::identify_stores;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(e) => err_text(format!("failed to encode result: {}", e)),
    }
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

// ---------------------------------------------------------------------------
// ResearchBookMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct ResearchBookMcpServer {
    book: Arc<ResearchBook>,
    config: Arc<Config>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ResearchBookMcpServer {
    pub fn new(book: Arc<ResearchBook>, config: Arc<Config>) -> Self {
        Self {
            book,
            config,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Look up a person in both research databases and get an AI profile summary"
    )]
    async fn lookup_person(
        &self,
        Parameters(p): Parameters<LookupPersonParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.book.lookup_person(&p.name).await {
            Ok(result) => ok_json(&result),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(description = "Find and rank experts on a topic across both research databases")]
    async fn find_expert(
        &self,
        Parameters(p): Parameters<FindExpertParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.book.find_expert(&p.topic, p.limit).await {
            Ok(result) => ok_json(&result),
            Err(e) => err_text(e.to_string()),
        }
    }

    #[tool(
        description = "Report labels, counts and relationship types of both configured \
                       databases and whether they look swapped"
    )]
    async fn identify_databases(&self) -> Result<CallToolResult, McpError> {
        let outcomes = identify_stores(&self.config.research_db, &self.config.thesis_db).await;
        let swapped = outcomes.iter().any(|o| o.looks_swapped());
        ok_json(&serde_json::json!({
            "databases": outcomes,
            "swapped": swapped,
        }))
    }
}

#[tool_handler]
impl ServerHandler for ResearchBookMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "ResearchBook MCP server: researcher profiles and topic experts from a \
                 research-intelligence graph and a thesis-relationship graph"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run_mcp_server(config: Config) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let book = match ResearchBook::connect(&config).await {
            Ok(book) => book,
            Err(e) => {
                error!(error = %e, "failed to start researchbook");
                eprintln!("Error: {}", e);
                return 1;
            }
        };

        let server = ResearchBookMcpServer::new(Arc::new(book), Arc::new(config));

        info!("researchbook mcp server starting on stdio");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to start MCP server: {}", e);
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            eprintln!("MCP server error: {}", e);
            return 1;
        }

        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Affiliation, MemoryResearchStore, MemoryThesisStore, Person, Publication};
    use crate::llm::MockLlmClient;

    fn server(llm: MockLlmClient) -> ResearchBookMcpServer {
        let research = MemoryResearchStore::new()
            .with_person(Person::new("Ingrid Berg"))
            .with_affiliation("Ingrid Berg", Affiliation::new("University of Bergen"))
            .with_publication(
                "Ingrid Berg",
                Publication::new("Fjord currents").with_keywords("oceanography"),
            );
        let book = ResearchBook::in_memory(research, MemoryThesisStore::new(), Arc::new(llm));
        ResearchBookMcpServer::new(Arc::new(book), Arc::new(Config::default()))
    }

    fn body(result: &CallToolResult) -> String {
        serde_json::to_string(result).unwrap()
    }

    #[tokio::test]
    async fn lookup_person_returns_json_result() {
        let srv = server(MockLlmClient::replying("Oceanographer."));
        let result = srv
            .lookup_person(Parameters(LookupPersonParams {
                name: "ingrid".into(),
            }))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        let text = body(&result);
        assert!(text.contains("found_in_db1"));
        assert!(text.contains("Oceanographer."));
    }

    #[tokio::test]
    async fn find_expert_uses_limit_param() {
        let srv = server(MockLlmClient::replying("ranked"));
        let result = srv
            .find_expert(Parameters(FindExpertParams {
                topic: "oceanography".into(),
                limit: Some(1),
            }))
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        assert!(body(&result).contains("Ingrid Berg"));
    }

    #[tokio::test]
    async fn empty_name_is_a_tool_error() {
        let srv = server(MockLlmClient::replying("x"));
        let result = srv
            .lookup_person(Parameters(LookupPersonParams { name: " ".into() }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }
}
