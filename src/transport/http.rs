use crate::connector::{RawResponse, ToolCall, ToolDescriptor, ToolListing, TransportKind};
use crate::error::{BridgeError, Result};
use crate::transport::Transport;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Plain JSON-over-HTTP transport (`/health`, `/list_tools`, `/call_tool`)
pub struct HttpTransport {
    base_url: String,
    connect_timeout: Duration,
    client: Option<reqwest::Client>,
}

#[derive(Deserialize)]
struct ListToolsBody {
    tools: BTreeMap<String, Value>,
}

impl HttpTransport {
    pub fn new(base_url: String, connect_timeout: Duration) -> Self {
        Self {
            base_url,
            connect_timeout,
            client: None,
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), route)
    }

    fn client(&self) -> Result<&reqwest::Client> {
        self.client
            .as_ref()
            .ok_or_else(|| BridgeError::Transport(format!("{} is not open", self.base_url)))
    }

    async fn get(&self, route: &str) -> Result<reqwest::Response> {
        let response = self
            .client()?
            .get(self.url(route))
            .send()
            .await
            .map_err(|e| request_error(route, e))?;
        check_status(route, response)
    }

    async fn read_json(route: &str, response: reqwest::Response) -> Result<Value> {
        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(route, e))?;
        serde_json::from_slice(&body).map_err(BridgeError::protocol)
    }
}

fn request_error(route: &str, err: reqwest::Error) -> BridgeError {
    if err.is_connect() {
        BridgeError::transport(&format!("/{} connection failed", route), err)
    } else {
        BridgeError::transport(&format!("/{}", route), err)
    }
}

fn check_status(route: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        return Err(BridgeError::Protocol(format!(
            "/{} returned status {}",
            route, status
        )));
    }
    Ok(response)
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn open(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }

        info!("Opening HTTP transport to {}", self.base_url);

        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| BridgeError::connection(&self.base_url, e))?;

        let response = tokio::time::timeout(self.connect_timeout, client.get(self.url("health")).send())
            .await
            .map_err(|_| {
                BridgeError::Connection(format!(
                    "{}: health check timed out after {:?}",
                    self.base_url, self.connect_timeout
                ))
            })?
            .map_err(|e| BridgeError::connection(&self.base_url, e))?;

        if !response.status().is_success() {
            return Err(BridgeError::Connection(format!(
                "{}: health check returned status {}",
                self.base_url,
                response.status()
            )));
        }

        self.client = Some(client);
        debug!("HTTP transport to {} is open", self.base_url);
        Ok(())
    }

    async fn send_request(&mut self, call: &ToolCall) -> Result<RawResponse> {
        debug!("POST {} tool={}", self.url("call_tool"), call.tool_name);

        let response = self
            .client()?
            .post(self.url("call_tool"))
            .json(call)
            .send()
            .await
            .map_err(|e| request_error("call_tool", e))?;
        let response = check_status("call_tool", response)?;

        let body = Self::read_json("call_tool", response).await?;
        if !body.is_object() {
            return Err(BridgeError::Protocol(format!(
                "expected a JSON object from /call_tool, got: {}",
                body
            )));
        }

        Ok(RawResponse::Envelope(body))
    }

    async fn list_tools(&mut self) -> Result<ToolListing> {
        let response = self.get("list_tools").await?;
        let body = Self::read_json("list_tools", response).await?;
        let body: ListToolsBody = serde_json::from_value(body).map_err(BridgeError::protocol)?;

        let mut tools = ToolListing::new();
        for (name, descriptor) in body.tools {
            let description = descriptor
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
            let input_schema = descriptor
                .get("input_schema")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()));
            tools.insert(
                name.clone(),
                ToolDescriptor {
                    name,
                    description,
                    input_schema,
                },
            );
        }

        Ok(tools)
    }

    async fn health(&mut self) -> Result<()> {
        self.get("health").await.map(|_| ())
    }

    async fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("Closed HTTP transport to {}", self.base_url);
        }
    }
}
