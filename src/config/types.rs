use crate::connector::{Endpoint, TransportKind};
use crate::error::BridgeError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub connector: ConnectorConfig,
    #[serde(default)]
    pub endpoint: Option<EndpointConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Timeouts applied by every `Connector`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl ConnectorConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Both timeouts must be non-zero
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(BridgeError::Config(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(BridgeError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the tool server lives
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndpointConfig {
    Http {
        url: String,
    },
    McpHttp {
        url: String,
    },
    LocalProcess {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

impl EndpointConfig {
    pub fn to_endpoint(&self) -> Endpoint {
        match self {
            EndpointConfig::Http { url } => Endpoint::new(TransportKind::Http, url.clone()),
            EndpointConfig::McpHttp { url } => Endpoint::new(TransportKind::McpHttp, url.clone()),
            EndpointConfig::LocalProcess { command, args, env } => {
                Endpoint::new(TransportKind::LocalProcess, command.clone())
                    .with_args(args.clone())
                    .with_env(env.clone())
            }
        }
    }
}

/// Credentials and location of the business-data backend.
/// Read by the built-in tool handlers only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub db: String,
    pub username: String,
    pub password: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8069".to_string(),
            db: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}
