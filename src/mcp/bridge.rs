// MCP server face of the tool registry, shared by the stdio and streamable-HTTP servers

use crate::connector::{ToolCall, ToolResult};
use crate::tools::ToolRegistry;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use std::sync::Arc;
use tracing::debug;

/// Serves registry tools over MCP
#[derive(Clone)]
pub(crate) struct RegistryBridge {
    registry: ToolRegistry,
}

impl RegistryBridge {
    pub(crate) fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }
}

fn into_call_result(result: ToolResult) -> CallToolResult {
    let (text, is_error) = match result.into_result() {
        Ok(value) => (value.to_string(), false),
        Err(message) => (message, true),
    };

    CallToolResult {
        meta: None,
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(is_error),
    }
}

impl ServerHandler for RegistryBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "Business-data tools ({} available)",
                self.registry.len()
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        debug!("MCP list_tools");

        let tools: Vec<rmcp::model::Tool> = self
            .registry
            .list_tools()
            .into_values()
            .map(|t| rmcp::model::Tool {
                name: t.name.into(),
                title: None,
                description: t.description.map(Into::into),
                input_schema: Arc::new(t.input_schema.as_object().cloned().unwrap_or_default()),
                output_schema: None,
                annotations: None,
                icons: None,
                meta: None,
            })
            .collect();

        Ok(ListToolsResult {
            meta: None,
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        debug!("MCP call_tool: {}", params.name);

        let call = ToolCall::new(params.name.to_string(), params.arguments.unwrap_or_default())
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        Ok(into_call_result(self.registry.dispatch(call).await))
    }
}
