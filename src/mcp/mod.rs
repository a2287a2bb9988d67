pub(crate) mod bridge;
pub(crate) mod client;
pub(crate) mod http_service;
pub(crate) mod stdio;

pub(crate) use client::McpClient;
pub(crate) use http_service::registry_service;
pub use stdio::serve_stdio;
