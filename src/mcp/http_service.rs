use super::bridge::RegistryBridge;
use crate::tools::ToolRegistry;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Streamable-HTTP MCP service over the registry; one bridge per session
pub(crate) fn registry_service(
    registry: ToolRegistry,
    cancellation_token: CancellationToken,
) -> StreamableHttpService<RegistryBridge, LocalSessionManager> {
    StreamableHttpService::new(
        move || Ok(RegistryBridge::new(registry.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig {
            stateful_mode: true,
            sse_keep_alive: Some(Duration::from_secs(15)),
            sse_retry: Some(Duration::from_secs(3)),
            cancellation_token,
        },
    )
}
