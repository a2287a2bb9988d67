use crate::connector::{RawResponse, ToolCall, ToolListing, TransportKind};
use crate::error::{BridgeError, Result};
use crate::mcp::McpClient;
use crate::transport::Transport;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

/// MCP over streamable HTTP, as used by inspector and proxy deployments
pub struct McpHttpTransport {
    url: String,
    handshake_timeout: Duration,
    client: McpClient,
}

impl McpHttpTransport {
    pub fn new(url: String, handshake_timeout: Duration) -> Self {
        let client = McpClient::new(url.clone());
        Self {
            url,
            handshake_timeout,
            client,
        }
    }
}

#[async_trait]
impl Transport for McpHttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::McpHttp
    }

    async fn open(&mut self) -> Result<()> {
        if self.client.is_open() {
            return Ok(());
        }

        info!("Connecting to remote MCP tool server at {}", self.url);
        self.client
            .init_with_http(&self.url, self.handshake_timeout)
            .await?;

        match self.client.list_tools().await {
            Ok(tools) => info!(
                "Connected to {} ({} tools available)",
                self.url,
                tools.len()
            ),
            Err(e) => warn!("Connected to {} but failed to list tools: {}", self.url, e),
        }

        Ok(())
    }

    async fn send_request(&mut self, call: &ToolCall) -> Result<RawResponse> {
        self.client.call_tool(call).await
    }

    async fn list_tools(&mut self) -> Result<ToolListing> {
        self.client.list_tools().await
    }

    async fn health(&mut self) -> Result<()> {
        if !self.client.is_open() {
            return Err(BridgeError::Transport(format!("{} is not open", self.url)));
        }
        self.client.list_tools().await.map(|_| ())
    }

    async fn close(&mut self) {
        self.client.close().await;
    }
}
