use crate::connector::{Endpoint, RawResponse, ToolCall, ToolListing, TransportKind};
use crate::error::{BridgeError, Result};
use crate::mcp::McpClient;
use crate::transport::Transport;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// MCP over the stdio of a child process running the tool server
pub struct LocalProcessTransport {
    endpoint: Endpoint,
    handshake_timeout: Duration,
    client: McpClient,
}

impl LocalProcessTransport {
    pub fn new(endpoint: Endpoint, handshake_timeout: Duration) -> Self {
        let client = McpClient::new(endpoint.address().to_string());
        Self {
            endpoint,
            handshake_timeout,
            client,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(self.endpoint.address());
        cmd.args(self.endpoint.args())
            .envs(self.endpoint.env())
            .stderr(Stdio::inherit());
        cmd
    }
}

#[async_trait]
impl Transport for LocalProcessTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::LocalProcess
    }

    async fn open(&mut self) -> Result<()> {
        if self.client.is_open() {
            return Ok(());
        }

        info!("Starting local tool server: {}", self.endpoint);
        debug!(
            "Command: {} {}",
            self.endpoint.address(),
            self.endpoint.args().join(" ")
        );

        let command = self.command();
        self.client
            .init_with_command(command, self.handshake_timeout)
            .await
    }

    async fn send_request(&mut self, call: &ToolCall) -> Result<RawResponse> {
        self.client.call_tool(call).await
    }

    async fn list_tools(&mut self) -> Result<ToolListing> {
        self.client.list_tools().await
    }

    async fn health(&mut self) -> Result<()> {
        if !self.client.is_open() {
            return Err(BridgeError::Transport(format!(
                "{} is not running",
                self.endpoint.address()
            )));
        }
        self.client.list_tools().await.map(|_| ())
    }

    async fn close(&mut self) {
        self.client.close().await;
    }
}
