use crate::connector::{ToolCall, ToolResult};
use crate::error::BridgeError;
use crate::tools::ToolRegistry;
use axum::{Json, body::Bytes, extract::State, response::IntoResponse};
use serde_json::json;
use tracing::{debug, info};

/// Application state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    pub registry: ToolRegistry,
}

pub(crate) async fn health_check() -> impl IntoResponse {
    Json(json!({}))
}

pub(crate) async fn list_tools(State(state): State<ApiState>) -> impl IntoResponse {
    debug!("Listing {} tools", state.registry.len());
    Json(json!({ "tools": state.registry.list_tools() }))
}

pub(crate) async fn call_tool(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<ToolResult>, BridgeError> {
    // malformed bodies answer with the JSON error reply, whatever the content type
    let call: ToolCall = serde_json::from_slice(&body)
        .map_err(|e| BridgeError::InvalidRequest(format!("malformed tool call: {}", e)))?;
    let call = ToolCall::new(call.tool_name, call.parameters)?;

    info!("Received call for tool: {}", call.tool_name);
    Ok(Json(state.registry.dispatch(call).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::EchoTool;
    use axum::http::StatusCode;
    use serde_json::Value;

    fn body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    fn create_test_state() -> ApiState {
        let registry = ToolRegistry::builder()
            .register(EchoTool("search_records"))
            .unwrap()
            .register(EchoTool("advanced_search"))
            .unwrap()
            .build();
        ApiState { registry }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({}));
    }

    #[tokio::test]
    async fn test_list_tools() {
        let response = list_tools(State(create_test_state())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let tools = json["tools"].as_object().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools["search_records"]["name"], "search_records");
    }

    #[tokio::test]
    async fn test_call_tool_success() {
        let payload = json!({"tool": "search_records", "params": {"query": "Acme"}});
        let response = call_tool(State(create_test_state()), body(payload))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["result"]["params"]["query"], "Acme");
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_not_http_error() {
        let payload = json!({"tool": "generate_npx", "params": {}});
        let response = call_tool(State(create_test_state()), body(payload))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(
            json,
            json!({"success": false, "error": "tool not found: generate_npx"})
        );
    }

    #[tokio::test]
    async fn test_call_tool_malformed_body() {
        let result = call_tool(State(create_test_state()), body(json!({"params": {}}))).await;
        assert!(matches!(result, Err(BridgeError::InvalidRequest(_))));

        let result = call_tool(State(create_test_state()), body(json!({"tool": ""}))).await;
        assert!(matches!(result, Err(BridgeError::InvalidRequest(_))));

        let result = call_tool(State(create_test_state()), Bytes::from_static(b"not json")).await;
        assert!(matches!(result, Err(BridgeError::InvalidRequest(_))));
    }
}
