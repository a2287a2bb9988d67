use crate::connector::{RawResponse, ToolCall, ToolListing, TransportKind};
use crate::error::Result;
use async_trait::async_trait;

/// Channel between a `Connector` and a tool server.
/// A transport is exclusively owned by one connector and handles one request at a time.
#[async_trait]
pub trait Transport: Send {
    /// The transport variant
    fn kind(&self) -> TransportKind;

    /// Establish the underlying handle (socket, child process).
    /// Fails with `BridgeError::Connection`.
    async fn open(&mut self) -> Result<()>;

    /// Send one tool call and wait for its response.
    /// I/O failures come back as `Transport`/`Timeout`, bad payloads as `Protocol`.
    async fn send_request(&mut self, call: &ToolCall) -> Result<RawResponse>;

    /// Fetch the server's tool descriptors
    async fn list_tools(&mut self) -> Result<ToolListing>;

    /// Check the server is reachable and ready
    async fn health(&mut self) -> Result<()>;

    /// Release the handle; idempotent and infallible
    async fn close(&mut self);
}
