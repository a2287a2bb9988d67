#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tool_bridge::config::ConnectorConfig;
use tool_bridge::connector::{Endpoint, ToolDescriptor, ToolParams};
use tool_bridge::tools::{ToolHandler, ToolRegistry};
use tool_bridge::{BridgeError, Result, api};

// ──────────────────────────────────────────────
// Test tools
// ──────────────────────────────────────────────

/// Returns `{"tool": <name>, "params": <params>}`
pub struct EchoTool(pub &'static str);

#[async_trait]
impl ToolHandler for EchoTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.0.to_string(),
            description: Some(format!("Echo for {}", self.0)),
            input_schema: json!({"type": "object"}),
        }
    }

    async fn call(&self, params: ToolParams) -> Result<Value> {
        if params.get("fail").and_then(Value::as_bool) == Some(true) {
            return Err(BridgeError::ToolExecution("requested failure".to_string()));
        }
        Ok(json!({"tool": self.0, "params": params}))
    }
}

/// Sleeps for `params.millis` before answering
pub struct SlowTool;

#[async_trait]
impl ToolHandler for SlowTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "slow".to_string(),
            description: None,
            input_schema: json!({"type": "object"}),
        }
    }

    async fn call(&self, params: ToolParams) -> Result<Value> {
        let millis = params.get("millis").and_then(Value::as_u64).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok(json!({"slept_ms": millis}))
    }
}

pub const TOOL_NAMES: [&str; 4] = [
    "advanced_search",
    "generate_npx",
    "retrieve_odoo_documentation",
    "search_records",
];

/// Echo tools under the four business tool names, plus `slow`
pub fn test_registry() -> ToolRegistry {
    let mut builder = ToolRegistry::builder();
    for name in TOOL_NAMES {
        builder = builder.register(EchoTool(name)).unwrap();
    }
    builder.register(SlowTool).unwrap().build()
}

// ──────────────────────────────────────────────
// Live server
// ──────────────────────────────────────────────

pub struct TestServer {
    pub addr: SocketAddr,
    ct: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn mcp_url(&self) -> String {
        format!("http://{}/mcp", self.addr)
    }

    /// Stop accepting connections and wait for the server task to end
    pub async fn shutdown(mut self) {
        self.ct.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.ct.cancel();
    }
}

/// Serve `registry` on an ephemeral port
pub async fn spawn_server(registry: ToolRegistry) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let ct = CancellationToken::new();
    let stop = ct.clone();
    let handle = tokio::spawn({
        let ct = ct.clone();
        async move {
            api::serve(listener, registry, ct, async move { stop.cancelled().await })
                .await
                .unwrap();
        }
    });

    TestServer {
        addr,
        ct,
        handle: Some(handle),
    }
}

pub fn fast_config() -> ConnectorConfig {
    ConnectorConfig {
        connect_timeout_secs: 2,
        request_timeout_secs: 5,
    }
}

/// Address that refuses connections
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn params(value: Value) -> ToolParams {
    value.as_object().cloned().unwrap()
}

// ──────────────────────────────────────────────
// Local process fixtures
// ──────────────────────────────────────────────

pub const BIN: &str = env!("CARGO_BIN_EXE_tool-bridge");

/// `serve --stdio` behind a shell relay that exits on the first `tools/call`
/// message, so the server disappears with that call still unanswered
pub fn exits_mid_call_endpoint() -> Endpoint {
    let relay = r#"while IFS= read -r line; do
  case "$line" in
    *'"tools/call"'*) exit 0 ;;
  esac
  printf '%s\n' "$line"
done | "$0" serve --stdio"#;

    Endpoint::local_process("sh").with_args(vec![
        "-c".to_string(),
        relay.to_string(),
        BIN.to_string(),
    ])
}

/// `serve --stdio` with its business backend pointed at `backend_url`
pub fn stdio_server_endpoint(backend_url: String) -> Endpoint {
    Endpoint::local_process(BIN)
        .with_args(vec!["serve".to_string(), "--stdio".to_string()])
        .with_env(HashMap::from([
            ("ODOO_URL".to_string(), backend_url),
            ("ODOO_DB".to_string(), "demo".to_string()),
            ("ODOO_USERNAME".to_string(), "admin".to_string()),
            ("ODOO_PASSWORD".to_string(), "admin".to_string()),
        ]))
}
