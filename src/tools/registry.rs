use crate::connector::{ToolCall, ToolDescriptor, ToolListing, ToolParams, ToolResult};
use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A server-hosted tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Name, description and input schema advertised to clients
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool. Failures surface to the caller as `ToolResult` errors.
    async fn call(&self, params: ToolParams) -> Result<Value>;
}

/// Tool name → handler map, built once at startup and read-only afterwards
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

/// Collects handlers before the registry is frozen
#[derive(Default)]
pub struct ToolRegistryBuilder {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistryBuilder {
    /// Register a handler under its descriptor name
    pub fn register(mut self, handler: impl ToolHandler + 'static) -> Result<Self> {
        let name = handler.descriptor().name;
        if name.trim().is_empty() {
            return Err(BridgeError::Config(
                "tool name must not be empty".to_string(),
            ));
        }
        if self.handlers.contains_key(&name) {
            return Err(BridgeError::Config(format!(
                "tool already registered: {}",
                name
            )));
        }

        debug!("Registered tool: {}", name);
        self.handlers.insert(name, Arc::new(handler));
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        info!("Tool registry ready with {} tools", self.handlers.len());
        ToolRegistry {
            handlers: Arc::new(self.handlers),
        }
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Descriptors of every registered tool, keyed by name
    pub fn list_tools(&self) -> ToolListing {
        self.handlers
            .iter()
            .map(|(name, handler)| (name.clone(), handler.descriptor()))
            .collect()
    }

    /// Look up and run a tool. Unknown names and handler failures
    /// become failed results, never errors.
    pub async fn dispatch(&self, call: ToolCall) -> ToolResult {
        let Some(handler) = self.handlers.get(&call.tool_name) else {
            warn!("Unknown tool requested: {}", call.tool_name);
            return ToolResult::failure(BridgeError::ToolNotFound(call.tool_name).to_string());
        };

        debug!("Dispatching tool: {}", call.tool_name);
        match handler.call(call.parameters).await {
            Ok(value) => ToolResult::success(value),
            Err(e) => {
                warn!("Tool '{}' failed: {}", call.tool_name, e);
                ToolResult::failure(e.classify())
            }
        }
    }
}
