mod blocking;
mod normalize;
mod types;

pub use blocking::BlockingConnector;
pub use types::{
    ConnectionState, Endpoint, RawResponse, ToolCall, ToolContent, ToolDescriptor, ToolListing,
    ToolParams, ToolResult, TransportKind,
};

use crate::config::ConnectorConfig;
use crate::error::{BridgeError, Result};
use crate::transport::{Transport, build_transport};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Client-side façade over a single transport.
///
/// Lifecycle: `Disconnected` → `connect()` → `Connected` → `close()` → `Closed`.
/// A failed connect or a call that breaks the transport (timeout, dropped
/// connection) returns the connector to `Disconnected`; nothing reconnects
/// on its own.
pub struct Connector {
    endpoint: Endpoint,
    transport: Box<dyn Transport>,
    state: ConnectionState,
    request_timeout: Duration,
}

impl Connector {
    /// Create a connector for `endpoint`. Fails only on invalid configuration.
    pub fn new(endpoint: Endpoint, config: &ConnectorConfig) -> Result<Self> {
        endpoint.validate()?;
        let transport = build_transport(&endpoint, config);
        Self::with_transport(endpoint, transport, config)
    }

    /// Create a connector around a caller-supplied transport
    pub fn with_transport(
        endpoint: Endpoint,
        transport: Box<dyn Transport>,
        config: &ConnectorConfig,
    ) -> Result<Self> {
        if transport.kind() != endpoint.kind() {
            return Err(BridgeError::Config(format!(
                "{} transport cannot serve a {} endpoint",
                transport.kind(),
                endpoint.kind()
            )));
        }
        config.validate()?;

        Ok(Self {
            endpoint,
            transport,
            state: ConnectionState::Disconnected,
            request_timeout: config.request_timeout(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Open the transport. Returns `Ok(false)` when the server cannot be reached;
    /// `Err` only for a connector that has already been closed.
    pub async fn connect(&mut self) -> Result<bool> {
        match self.state {
            ConnectionState::Closed => return Err(BridgeError::not_connected(self.state)),
            ConnectionState::Connected => return Ok(true),
            ConnectionState::Disconnected | ConnectionState::Connecting => {}
        }

        info!("Connecting to tool server: {}", self.endpoint);
        self.state = ConnectionState::Connecting;

        match self.transport.open().await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                info!("Connected to tool server: {}", self.endpoint);
                Ok(true)
            }
            Err(e) => {
                error!("Failed to connect to {}: {}", self.endpoint, e);
                self.transport.close().await;
                self.state = ConnectionState::Disconnected;
                Ok(false)
            }
        }
    }

    /// Invoke a tool with the configured request timeout
    pub async fn call_tool(
        &mut self,
        name: impl Into<String>,
        params: ToolParams,
    ) -> Result<ToolResult> {
        let timeout = self.request_timeout;
        self.call_tool_with_timeout(name, params, timeout).await
    }

    /// Invoke a tool, aborting after `timeout`.
    ///
    /// Every outcome past the state check is a `ToolResult`; transport failures
    /// are classified into its error message.
    pub async fn call_tool_with_timeout(
        &mut self,
        name: impl Into<String>,
        params: ToolParams,
        timeout: Duration,
    ) -> Result<ToolResult> {
        self.ensure_connected()?;
        let call = ToolCall::new(name, params)?;

        debug!("Calling tool '{}' via {}", call.tool_name, self.endpoint);

        let outcome = match tokio::time::timeout(timeout, self.transport.send_request(&call)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::Timeout(timeout)),
        };

        if let Err(e) = &outcome {
            self.handle_transport_error(&call.tool_name, e).await;
        }

        let result = normalize::normalize(outcome);
        if let Some(err) = result.error() {
            debug!("Tool '{}' failed: {}", call.tool_name, err);
        }
        Ok(result)
    }

    /// List tools advertised by the server
    pub async fn list_tools(&mut self) -> Result<ToolListing> {
        self.ensure_connected()?;

        let timeout = self.request_timeout;
        let outcome = match tokio::time::timeout(timeout, self.transport.list_tools()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::Timeout(timeout)),
        };

        if let Err(e) = &outcome {
            self.handle_transport_error("list_tools", e).await;
        }
        outcome
    }

    /// Probe the server. An unhealthy server is `Ok(false)`, not an error.
    pub async fn health(&mut self) -> Result<bool> {
        self.ensure_connected()?;

        let timeout = self.request_timeout;
        let outcome = match tokio::time::timeout(timeout, self.transport.health()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(BridgeError::Timeout(timeout)),
        };

        match outcome {
            Ok(()) => Ok(true),
            Err(e) => {
                self.handle_transport_error("health", &e).await;
                Ok(false)
            }
        }
    }

    /// Release the transport. Safe to call repeatedly and after failures.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        self.transport.close().await;
        self.state = ConnectionState::Closed;
        info!("Closed connector for {}", self.endpoint);
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.state {
            ConnectionState::Connected => Ok(()),
            state => Err(BridgeError::not_connected(state)),
        }
    }

    async fn handle_transport_error(&mut self, operation: &str, err: &BridgeError) {
        if err.requires_reconnect() {
            warn!(
                "{} on {} failed, connection dropped: {}",
                operation, self.endpoint, err
            );
            self.transport.close().await;
            self.state = ConnectionState::Disconnected;
        } else {
            warn!("{} on {} failed: {}", operation, self.endpoint, err);
        }
    }
}
