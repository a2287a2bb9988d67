pub mod handlers;
pub mod routes;

use crate::config::ServerConfig;
use crate::mcp::registry_service;
use crate::tools::ToolRegistry;
use anyhow::Result;
use axum::Router;
use handlers::ApiState;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Bind the configured address and serve until Ctrl+C or SIGTERM
pub async fn start_server(config: &ServerConfig, registry: ToolRegistry) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    info!("  → Health:     GET  http://{}/health", addr);
    info!("  → List tools: GET  http://{}/list_tools", addr);
    info!("  → Call tool:  POST http://{}/call_tool", addr);
    info!("  → MCP:        http://{}/mcp", addr);

    let ct = CancellationToken::new();
    serve(listener, registry, ct.clone(), shutdown_signal(ct)).await
}

/// Serve on an already-bound listener until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    registry: ToolRegistry,
    ct: CancellationToken,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = build_router(registry, ct.child_token());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    ct.cancel();
    Ok(())
}

/// Routes for the JSON protocol plus the MCP service under `/mcp`
pub fn build_router(registry: ToolRegistry, ct: CancellationToken) -> Router {
    let mcp_service = registry_service(registry.clone(), ct);
    let state = ApiState { registry };

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::tool_routes())
        .nest_service("/mcp", mcp_service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal(ct: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down...");
        },
    }

    // ends open MCP sessions so graceful shutdown can complete
    ct.cancel();
}
