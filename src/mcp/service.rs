//! MCP service implementation using rmcp.
//!
//! `SteampipeService` implements `ServerHandler` by hand: tool listing and
//! invocation are delegated to the [`ToolDispatcher`], so validation and the
//! result envelope are decided in one place rather than by per-tool macros.

use crate::cli::PlatformCli;
use crate::db::{ConnectionManager, QueryExecutor, SchemaInspector};
use crate::error::DbResult;
use crate::mcp::{prompts, resources};
use crate::tools::{ToolDispatcher, ToolRegistry};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
        Implementation, ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam,
        ReadResourceResult, ResourceContents, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct SteampipeService {
    dispatcher: ToolDispatcher,
    inspector: SchemaInspector,
    manager: Arc<ConnectionManager>,
}

impl SteampipeService {
    /// Create a service over `manager`.
    ///
    /// # Arguments
    ///
    /// * `manager` - Shared connection manager for all database operations
    /// * `cli` - Steampipe CLI runner for tools that do not need the database
    /// * `query_timeout` - Client-side bound on each statement
    pub fn new(
        manager: Arc<ConnectionManager>,
        cli: PlatformCli,
        query_timeout: Duration,
    ) -> DbResult<Self> {
        let registry = Arc::new(ToolRegistry::builtin()?);
        let executor = QueryExecutor::new(manager.clone(), query_timeout);
        Ok(Self {
            dispatcher: ToolDispatcher::new(registry, executor.clone(), cli),
            inspector: SchemaInspector::new(executor),
            manager,
        })
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }
}

impl ServerHandler for SteampipeService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "steampipe-mcp-server".to_owned(),
                title: Some("Steampipe MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Query cloud, SaaS and infrastructure data through Steampipe SQL.\n\
                \n\
                ## Workflow\n\
                1. `schema_list` to see the plugin connections (one schema each)\n\
                2. `table_list` with a schema to find tables\n\
                3. `table_show` to see a table's columns\n\
                4. `query` with read-only SQL; bind values through `params`\n\
                \n\
                ## Notes\n\
                - Queries run in read-only transactions.\n\
                - Select only the columns you need; every column can cost API calls.\n\
                - If the service was restarted, call `reconnect`.\n\
                - `clear_cache` forces fresh data on the next query.\n\
                - The `best_practices` prompt has query-writing guidelines."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.dispatcher.list_tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        debug!(tool = %request.name, "Tool call received");
        Ok(self
            .dispatcher
            .invoke(&request.name, request.arguments)
            .await)
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(resources::list()))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult::with_all_items(
            resources::templates(),
        ))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let text = resources::read(&self.manager, &self.inspector, &request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(prompts::list()))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        prompts::get(&request.name).ok_or_else(|| {
            McpError::invalid_params(format!("Unknown prompt: {}", request.name), None)
        })
    }
}
