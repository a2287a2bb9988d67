use super::{ConnectionState, Connector, Endpoint, ToolListing, ToolParams, ToolResult};
use crate::config::ConnectorConfig;
use crate::error::{BridgeError, Result};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

const REQUEST_BUFFER: usize = 32;

enum ConnectorRequest {
    Connect {
        resp: oneshot::Sender<Result<bool>>,
    },
    CallTool {
        name: String,
        params: ToolParams,
        timeout: Option<Duration>,
        resp: oneshot::Sender<Result<ToolResult>>,
    },
    ListTools {
        resp: oneshot::Sender<Result<ToolListing>>,
    },
    Health {
        resp: oneshot::Sender<Result<bool>>,
    },
    State {
        resp: oneshot::Sender<ConnectionState>,
    },
    Close {
        resp: oneshot::Sender<()>,
    },
}

/// Synchronous front for a `Connector`.
///
/// The async connector lives on a dedicated worker thread with its own
/// current-thread runtime; each method sends one request and blocks on the
/// reply, so calls are processed strictly in order. Must not be called from
/// inside an async runtime.
pub struct BlockingConnector {
    endpoint: Endpoint,
    tx: Option<mpsc::Sender<ConnectorRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl BlockingConnector {
    pub fn new(endpoint: Endpoint, config: &ConnectorConfig) -> Result<Self> {
        let connector = Connector::new(endpoint, config)?;
        Self::from_connector(connector)
    }

    /// Move an existing connector onto a worker thread
    pub fn from_connector(connector: Connector) -> Result<Self> {
        let endpoint = connector.endpoint().clone();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (tx, rx) = mpsc::channel(REQUEST_BUFFER);
        let worker = std::thread::Builder::new()
            .name("tool-bridge-connector".to_string())
            .spawn(move || runtime.block_on(run_worker(connector, rx)))?;

        Ok(Self {
            endpoint,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.request(|resp| ConnectorRequest::State { resp })
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn connect(&self) -> Result<bool> {
        self.request(|resp| ConnectorRequest::Connect { resp })?
    }

    pub fn call_tool(&self, name: impl Into<String>, params: ToolParams) -> Result<ToolResult> {
        let name = name.into();
        self.request(|resp| ConnectorRequest::CallTool {
            name,
            params,
            timeout: None,
            resp,
        })?
    }

    pub fn call_tool_with_timeout(
        &self,
        name: impl Into<String>,
        params: ToolParams,
        timeout: Duration,
    ) -> Result<ToolResult> {
        let name = name.into();
        self.request(|resp| ConnectorRequest::CallTool {
            name,
            params,
            timeout: Some(timeout),
            resp,
        })?
    }

    pub fn list_tools(&self) -> Result<ToolListing> {
        self.request(|resp| ConnectorRequest::ListTools { resp })?
    }

    pub fn health(&self) -> Result<bool> {
        self.request(|resp| ConnectorRequest::Health { resp })?
    }

    /// Close the underlying connector; idempotent
    pub fn close(&self) {
        if let Err(e) = self.request(|resp| ConnectorRequest::Close { resp }) {
            debug!("Close on stopped connector worker: {}", e);
        }
    }

    fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ConnectorRequest,
    ) -> Result<T> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| BridgeError::Internal("connector worker has stopped".to_string()))?;

        let (resp_tx, resp_rx) = oneshot::channel();
        tx.blocking_send(build(resp_tx))
            .map_err(|_| BridgeError::Internal("connector worker has stopped".to_string()))?;

        resp_rx
            .blocking_recv()
            .map_err(|_| BridgeError::Internal("connector worker dropped the request".to_string()))
    }
}

impl Drop for BlockingConnector {
    fn drop(&mut self) {
        // closing the channel makes the worker close the connector and exit
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("Connector worker for {} panicked", self.endpoint);
        }
    }
}

async fn run_worker(mut connector: Connector, mut rx: mpsc::Receiver<ConnectorRequest>) {
    while let Some(request) = rx.recv().await {
        match request {
            ConnectorRequest::Connect { resp } => {
                let _ = resp.send(connector.connect().await);
            }
            ConnectorRequest::CallTool {
                name,
                params,
                timeout,
                resp,
            } => {
                let timeout = timeout.unwrap_or_else(|| connector.request_timeout());
                let result = connector
                    .call_tool_with_timeout(name, params, timeout)
                    .await;
                let _ = resp.send(result);
            }
            ConnectorRequest::ListTools { resp } => {
                let _ = resp.send(connector.list_tools().await);
            }
            ConnectorRequest::Health { resp } => {
                let _ = resp.send(connector.health().await);
            }
            ConnectorRequest::State { resp } => {
                let _ = resp.send(connector.state());
            }
            ConnectorRequest::Close { resp } => {
                connector.close().await;
                let _ = resp.send(());
            }
        }
    }

    connector.close().await;
}
