use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not connected: {0}")]
    NotConnected(String),

    #[error("transport error: request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transport error: malformed response: {0}")]
    Protocol(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub(crate) fn not_connected(state: impl std::fmt::Display) -> Self {
        BridgeError::NotConnected(format!("connector is {}", state))
    }

    pub(crate) fn transport(context: &str, err: impl std::fmt::Display) -> Self {
        BridgeError::Transport(format!("{}: {}", context, err))
    }

    pub(crate) fn protocol(err: impl std::fmt::Display) -> Self {
        BridgeError::Protocol(err.to_string())
    }

    pub(crate) fn connection(address: &str, err: impl std::fmt::Display) -> Self {
        BridgeError::Connection(format!("{}: {}", address, err))
    }

    /// Message placed into a failed `ToolResult`
    pub fn classify(&self) -> String {
        match self {
            BridgeError::Io(e) => format!("transport error: {}", e),
            BridgeError::Json(e) => format!("transport error: malformed response: {}", e),
            other => other.to_string(),
        }
    }

    /// Whether the transport handle is unusable after this error
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            BridgeError::Timeout(_) | BridgeError::Transport(_) | BridgeError::Io(_)
        )
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BridgeError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BridgeError::Connection(_) => StatusCode::BAD_GATEWAY,
            BridgeError::NotConnected(_) => StatusCode::SERVICE_UNAVAILABLE,
            BridgeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            BridgeError::Transport(_) => StatusCode::BAD_GATEWAY,
            BridgeError::Protocol(_) => StatusCode::BAD_GATEWAY,
            BridgeError::ToolNotFound(_) => StatusCode::NOT_FOUND,
            BridgeError::ToolExecution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BridgeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            BridgeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BridgeError::Json(_) => StatusCode::BAD_REQUEST,
            BridgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for BridgeError {
    fn from(err: anyhow::Error) -> Self {
        BridgeError::Internal(err.to_string())
    }
}

impl axum::response::IntoResponse for BridgeError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            BridgeError::Config("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            BridgeError::NotConnected("test".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            BridgeError::Timeout(Duration::from_secs(1)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            BridgeError::ToolNotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BridgeError::InvalidRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_tool_not_found_display() {
        let err = BridgeError::ToolNotFound("search_records".to_string());
        assert_eq!(err.to_string(), "tool not found: search_records");
        assert_eq!(err.classify(), "tool not found: search_records");
    }

    #[test]
    fn test_classify_transport_errors() {
        let timeout = BridgeError::Timeout(Duration::from_millis(250));
        assert_eq!(
            timeout.classify(),
            "transport error: request timed out after 250ms"
        );

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: BridgeError = io_err.into();
        assert!(err.classify().starts_with("transport error:"));
        assert!(err.classify().contains("pipe closed"));

        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: BridgeError = json_err.into();
        assert!(err.classify().starts_with("transport error: malformed response"));
    }

    #[test]
    fn test_requires_reconnect() {
        assert!(BridgeError::Timeout(Duration::from_secs(1)).requires_reconnect());
        assert!(BridgeError::Transport("dropped".to_string()).requires_reconnect());
        assert!(!BridgeError::Protocol("status 500".to_string()).requires_reconnect());
        assert!(!BridgeError::ToolExecution("rejected".to_string()).requires_reconnect());
        assert!(!BridgeError::NotConnected("closed".to_string()).requires_reconnect());
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let err: BridgeError = anyhow_err.into();
        assert!(matches!(err, BridgeError::Internal(_)));
        assert!(err.to_string().contains("something went wrong"));
    }

    #[test]
    fn test_error_into_response() {
        use axum::response::IntoResponse;

        let err = BridgeError::InvalidRequest("missing tool".to_string());
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
