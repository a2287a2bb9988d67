pub mod api;
pub mod config;
pub mod connector;
pub mod error;
pub(crate) mod mcp;
pub mod tools;
pub mod transport;

pub use connector::{
    BlockingConnector, ConnectionState, Connector, Endpoint, ToolCall, ToolResult, TransportKind,
};
pub use error::{BridgeError, Result};
pub use mcp::serve_stdio;
