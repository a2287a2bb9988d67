use crate::config::BackendConfig;
use crate::error::{BridgeError, Result};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const BACKEND_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: Option<String>,
}

/// JSON-RPC client for the business-data backend.
/// Authenticates lazily on first use and reuses the session uid.
pub struct BackendClient {
    config: BackendConfig,
    http: reqwest::Client,
    uid: OnceCell<i64>,
    next_id: AtomicU64,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(BACKEND_TIMEOUT)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build backend client: {}", e)))?;

        Ok(Self {
            config,
            http,
            uid: OnceCell::new(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc(&self, service: &str, method: &str, args: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}/jsonrpc", self.config.url.trim_end_matches('/'));
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {"service": service, "method": method, "args": args},
            "id": id,
        });

        debug!("Backend call {}.{} (id {})", service, method, id);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BridgeError::ToolExecution(format!("backend unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(BridgeError::ToolExecution(format!(
                "backend returned status {}",
                response.status()
            )));
        }

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::ToolExecution(format!("invalid backend response: {}", e)))?;

        if let Some(error) = response.error {
            let detail = error
                .data
                .and_then(|d| d.message)
                .unwrap_or(error.message);
            return Err(BridgeError::ToolExecution(detail));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn uid(&self) -> Result<i64> {
        self.uid
            .get_or_try_init(|| async {
                let result = self
                    .rpc(
                        "common",
                        "authenticate",
                        json!([
                            self.config.db,
                            self.config.username,
                            self.config.password,
                            {}
                        ]),
                    )
                    .await?;

                let uid = result.as_i64().ok_or_else(|| {
                    BridgeError::ToolExecution(format!(
                        "authentication failed for user '{}' on database '{}'",
                        self.config.username, self.config.db
                    ))
                })?;

                info!("Authenticated to backend {} as uid {}", self.config.url, uid);
                Ok::<i64, BridgeError>(uid)
            })
            .await
            .copied()
    }

    /// Call `method` on `model` with positional and keyword arguments
    pub async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<Value> {
        let uid = self.uid().await?;
        self.rpc(
            "object",
            "execute_kw",
            json!([
                self.config.db,
                uid,
                self.config.password,
                model,
                method,
                args,
                kwargs
            ]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn backend(url: String) -> BackendClient {
        BackendClient::new(BackendConfig {
            url,
            db: "demo".to_string(),
            username: "admin".to_string(),
            password: "admin".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_execute_kw_authenticates_once() {
        let server = MockServer::start_async().await;
        let auth = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/jsonrpc")
                    .body_contains("\"authenticate\"");
                then.status(200)
                    .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": 2}));
            })
            .await;
        let search = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/jsonrpc")
                    .body_contains("\"execute_kw\"");
                then.status(200)
                    .json_body(json!({"jsonrpc": "2.0", "id": 2, "result": [[1, "Acme"]]}));
            })
            .await;

        let client = backend(server.base_url());
        for _ in 0..2 {
            let result = client
                .execute_kw("res.partner", "name_search", json!(["Acme"]), json!({}))
                .await
                .unwrap();
            assert_eq!(result, json!([[1, "Acme"]]));
        }

        auth.assert_hits_async(1).await;
        search.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_failed_authentication() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc");
                then.status(200)
                    .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": false}));
            })
            .await;

        let client = backend(server.base_url());
        let err = client
            .execute_kw("res.partner", "search_read", json!([]), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ToolExecution(_)));
        assert!(err.to_string().contains("authentication failed"));
    }

    #[tokio::test]
    async fn test_rpc_error_uses_detail_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/jsonrpc");
                then.status(200).json_body(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": {
                        "code": 200,
                        "message": "Odoo Server Error",
                        "data": {"message": "Access Denied"}
                    }
                }));
            })
            .await;

        let client = backend(server.base_url());
        let err = client
            .execute_kw("res.partner", "search_read", json!([]), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "tool execution failed: Access Denied");
    }
}
