use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Parameters passed to a tool, keyed by name
pub type ToolParams = Map<String, Value>;

/// A single tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(rename = "tool")]
    pub tool_name: String,
    #[serde(rename = "params", default)]
    pub parameters: ToolParams,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, parameters: ToolParams) -> Result<Self> {
        let tool_name = tool_name.into();
        if tool_name.trim().is_empty() {
            return Err(BridgeError::InvalidRequest(
                "tool name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            tool_name,
            parameters,
        })
    }
}

/// Outcome of a tool invocation. Exactly one of `result`/`error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToolResultWire", into = "ToolResultWire")]
pub struct ToolResult {
    outcome: std::result::Result<Value, String>,
}

#[derive(Serialize, Deserialize)]
struct ToolResultWire {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolResult {
    pub fn success(result: Value) -> Self {
        Self {
            outcome: Ok(result),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            outcome: Err(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }

    pub fn into_result(self) -> std::result::Result<Value, String> {
        self.outcome
    }
}

impl TryFrom<ToolResultWire> for ToolResult {
    type Error = String;

    fn try_from(wire: ToolResultWire) -> std::result::Result<Self, Self::Error> {
        match (wire.success, wire.result, wire.error) {
            (true, _, Some(_)) => Err("successful result must not carry an error".to_string()),
            (true, result, None) => Ok(ToolResult::success(result.unwrap_or(Value::Null))),
            (false, Some(_), _) => Err("failed result must not carry a result".to_string()),
            (false, None, error) => Ok(ToolResult::failure(
                error.unwrap_or_else(|| "tool reported failure without a message".to_string()),
            )),
        }
    }
}

impl From<ToolResult> for ToolResultWire {
    fn from(result: ToolResult) -> Self {
        match result.outcome {
            Ok(value) => ToolResultWire {
                success: true,
                result: Some(value),
                error: None,
            },
            Err(error) => ToolResultWire {
                success: false,
                result: None,
                error: Some(error),
            },
        }
    }
}

/// Lifecycle state of a `Connector`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Plain JSON over HTTP (`/health`, `/list_tools`, `/call_tool`)
    Http,
    /// MCP over the stdio of a child process
    LocalProcess,
    /// MCP over streamable HTTP
    McpHttp,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Http => "http",
            TransportKind::LocalProcess => "local_process",
            TransportKind::McpHttp => "mcp_http",
        };
        write!(f, "{}", s)
    }
}

/// Immutable description of the tool server a `Connector` talks to.
/// For `LocalProcess` the address is the executable to launch.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    kind: TransportKind,
    address: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl Endpoint {
    pub fn new(kind: TransportKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn http(url: impl Into<String>) -> Self {
        Self::new(TransportKind::Http, url)
    }

    pub fn mcp_http(url: impl Into<String>) -> Self {
        Self::new(TransportKind::McpHttp, url)
    }

    pub fn local_process(command: impl Into<String>) -> Self {
        Self::new(TransportKind::LocalProcess, command)
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Reject descriptors that can never connect
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(BridgeError::Config(format!(
                "{} endpoint address must not be empty",
                self.kind
            )));
        }

        match self.kind {
            TransportKind::Http | TransportKind::McpHttp => {
                let url = reqwest::Url::parse(&self.address).map_err(|e| {
                    BridgeError::Config(format!("invalid URL '{}': {}", self.address, e))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(BridgeError::Config(format!(
                        "unsupported URL scheme '{}' in '{}'",
                        url.scheme(),
                        self.address
                    )));
                }
            }
            TransportKind::LocalProcess => {}
        }

        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{} {}", self.kind, self.address)
        } else {
            write!(f, "{} {} {}", self.kind, self.address, self.args.join(" "))
        }
    }
}

/// Tool metadata as advertised by a server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "empty_schema")]
    pub input_schema: Value,
}

fn empty_schema() -> Value {
    Value::Object(Map::new())
}

/// Tools keyed by name
pub type ToolListing = BTreeMap<String, ToolDescriptor>;

/// Content block returned by an MCP tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        mime_type: String,
    },
    Resource {
        uri: String,
        mime_type: Option<String>,
    },
}

/// Response as produced by a transport, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// `{ "success": .., "result" | "error": .. }` body from the HTTP JSON protocol
    Envelope(Value),
    /// MCP `tools/call` result
    Content {
        content: Vec<ToolContent>,
        structured: Option<Value>,
        is_error: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_wire_format() {
        let mut params = ToolParams::new();
        params.insert("model_name".to_string(), json!("res.partner"));
        params.insert("query".to_string(), json!("company"));
        let call = ToolCall::new("search_records", params).unwrap();

        let wire = serde_json::to_value(&call).unwrap();
        assert_eq!(
            wire,
            json!({
                "tool": "search_records",
                "params": {"model_name": "res.partner", "query": "company"}
            })
        );
    }

    #[test]
    fn test_tool_call_rejects_empty_name() {
        assert!(ToolCall::new("", ToolParams::new()).is_err());
        assert!(ToolCall::new("   ", ToolParams::new()).is_err());
    }

    #[test]
    fn test_tool_result_success_serialization() {
        let result = ToolResult::success(json!([{"id": 1}]));
        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(wire, json!({"success": true, "result": [{"id": 1}]}));
    }

    #[test]
    fn test_tool_result_failure_serialization() {
        let result = ToolResult::failure("tool not found: search_records");
        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(
            wire,
            json!({"success": false, "error": "tool not found: search_records"})
        );
    }

    #[test]
    fn test_tool_result_success_without_result_is_null() {
        let result: ToolResult = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(result.is_success());
        assert_eq!(result.result(), Some(&Value::Null));
        assert_eq!(result.error(), None);
    }

    #[test]
    fn test_tool_result_rejects_both_fields() {
        let parsed = serde_json::from_value::<ToolResult>(json!({
            "success": true,
            "result": 1,
            "error": "boom"
        }));
        assert!(parsed.is_err());

        let parsed = serde_json::from_value::<ToolResult>(json!({
            "success": false,
            "result": 1
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(Endpoint::http("http://127.0.0.1:8000").validate().is_ok());
        assert!(Endpoint::mcp_http("https://tools.example.com/mcp").validate().is_ok());
        assert!(Endpoint::http("not a url").validate().is_err());
        assert!(Endpoint::http("ftp://example.com").validate().is_err());
        assert!(Endpoint::local_process("").validate().is_err());
        assert!(Endpoint::local_process("tool-bridge").validate().is_ok());
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "disconnected");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }
}
