use crate::connector::{RawResponse, ToolCall, ToolContent, ToolDescriptor, ToolListing};
use crate::error::{BridgeError, Result};
use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, PaginatedRequestParams, RawContent};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use serde_json::Value;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// An MCP client session owned by a single transport
pub(crate) struct McpClient {
    server_name: String,
    service: Option<RunningService<RoleClient, ()>>,
    ct: CancellationToken,
}

impl McpClient {
    pub(crate) fn new(server_name: String) -> Self {
        Self {
            server_name,
            service: None,
            ct: CancellationToken::new(),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.service.is_some()
    }

    /// Spawn the tool server and run the MCP handshake over its stdio
    pub(crate) async fn init_with_command(
        &mut self,
        mut command: Command,
        handshake_timeout: Duration,
    ) -> Result<()> {
        info!("Initializing MCP client for process: {}", self.server_name);

        command.kill_on_drop(true);
        let transport = TokioChildProcess::new(command).map_err(|e| {
            error!("Failed to spawn {}: {}", self.server_name, e);
            BridgeError::connection(&self.server_name, e)
        })?;

        self.ct = CancellationToken::new();
        let ct = self.ct.clone();

        let service = tokio::time::timeout(handshake_timeout, async {
            ().serve_with_ct(transport, ct).await
        })
        .await
        .map_err(|_| {
            self.ct.cancel();
            BridgeError::Connection(format!(
                "MCP handshake timed out after {:?} for process: {}",
                handshake_timeout, self.server_name
            ))
        })?
        .map_err(|e| BridgeError::connection(&self.server_name, e))?;

        self.service = Some(service);

        debug!("MCP client initialized for process: {}", self.server_name);
        Ok(())
    }

    /// Run the MCP handshake against a streamable HTTP endpoint
    pub(crate) async fn init_with_http(
        &mut self,
        url: &str,
        handshake_timeout: Duration,
    ) -> Result<()> {
        info!(
            "Initializing MCP HTTP client for server: {} at {}",
            self.server_name, url
        );

        let transport = StreamableHttpClientTransport::from_uri(url.to_string());

        self.ct = CancellationToken::new();
        let ct = self.ct.clone();

        let service = tokio::time::timeout(handshake_timeout, async {
            ().serve_with_ct(transport, ct).await
        })
        .await
        .map_err(|_| {
            self.ct.cancel();
            BridgeError::Connection(format!(
                "MCP handshake timed out after {:?} for server: {} at {}",
                handshake_timeout, self.server_name, url
            ))
        })?
        .map_err(|e| BridgeError::connection(url, e))?;

        self.service = Some(service);

        debug!(
            "MCP HTTP client initialized for server: {}",
            self.server_name
        );
        Ok(())
    }

    fn service(&self) -> Result<&RunningService<RoleClient, ()>> {
        self.service.as_ref().ok_or_else(|| {
            BridgeError::Transport(format!("session with {} is not open", self.server_name))
        })
    }

    /// List available tools from the MCP server
    pub(crate) async fn list_tools(&self) -> Result<ToolListing> {
        let service = self.service()?;

        debug!("Listing tools for server: {}", self.server_name);

        let mut tools = ToolListing::new();
        let mut cursor: Option<String> = None;

        loop {
            let request = Some(PaginatedRequestParams {
                meta: None,
                cursor: cursor.clone(),
            });

            let result = service.list_tools(request).await.map_err(|e| {
                error!("Failed to list tools for {}: {}", self.server_name, e);
                service_error("list tools", e)
            })?;

            for tool in result.tools {
                let name = tool.name.to_string();
                tools.insert(
                    name.clone(),
                    ToolDescriptor {
                        name,
                        description: tool.description.map(|d| d.to_string()),
                        input_schema: Value::Object((*tool.input_schema).clone()),
                    },
                );
            }

            cursor = result.next_cursor;
            if cursor.is_none() {
                break;
            }
        }

        debug!(
            "Found {} tools for server: {}",
            tools.len(),
            self.server_name
        );
        Ok(tools)
    }

    /// Call a tool on the MCP server
    pub(crate) async fn call_tool(&self, call: &ToolCall) -> Result<RawResponse> {
        let service = self.service()?;

        debug!(
            "Calling tool '{}' on server: {}",
            call.tool_name, self.server_name
        );

        let request = CallToolRequestParams {
            meta: None,
            name: call.tool_name.clone().into(),
            arguments: Some(call.parameters.clone()),
            task: None,
        };

        let result = service.call_tool(request).await.map_err(|e| {
            error!(
                "Failed to call tool '{}' on {}: {}",
                call.tool_name, self.server_name, e
            );
            service_error("call tool", e)
        })?;

        let content = result
            .content
            .into_iter()
            .filter_map(|c| match c.raw {
                RawContent::Text(text_content) => Some(ToolContent::Text {
                    text: text_content.text,
                }),
                RawContent::Image(image_content) => Some(ToolContent::Image {
                    data: image_content.data,
                    mime_type: image_content.mime_type,
                }),
                RawContent::Resource(resource_content) => match resource_content.resource {
                    rmcp::model::ResourceContents::TextResourceContents {
                        uri, mime_type, ..
                    } => Some(ToolContent::Resource { uri, mime_type }),
                    rmcp::model::ResourceContents::BlobResourceContents {
                        uri, mime_type, ..
                    } => Some(ToolContent::Resource { uri, mime_type }),
                },
                _ => None,
            })
            .collect();

        Ok(RawResponse::Content {
            content,
            structured: result.structured_content,
            is_error: result.is_error.unwrap_or(false),
        })
    }

    /// Close the session; safe to call repeatedly
    pub(crate) async fn close(&mut self) {
        self.ct.cancel();
        if let Some(mut service) = self.service.take() {
            debug!("Closing MCP session with {}", self.server_name);
            if let Err(e) = service.close().await {
                warn!("Error closing MCP session with {}: {}", self.server_name, e);
            }
        }
    }
}

/// JSON-RPC errors leave the session usable; everything else means the channel is gone
fn service_error(context: &str, err: rmcp::ServiceError) -> BridgeError {
    match err {
        rmcp::ServiceError::McpError(data) => BridgeError::ToolExecution(data.message.to_string()),
        other => BridgeError::transport(context, other),
    }
}
