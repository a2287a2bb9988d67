use super::bridge::RegistryBridge;
use crate::error::{BridgeError, Result};
use crate::tools::ToolRegistry;
use rmcp::ServiceExt;
use tracing::info;

/// Serve the registry as an MCP server on stdin/stdout until the peer hangs up
pub async fn serve_stdio(registry: ToolRegistry) -> Result<()> {
    info!("Serving {} tools over stdio", registry.len());

    let service = RegistryBridge::new(registry)
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| BridgeError::transport("stdio handshake", e))?;

    service
        .waiting()
        .await
        .map_err(|e| BridgeError::Internal(format!("stdio server task failed: {}", e)))?;

    info!("Stdio server finished");
    Ok(())
}
