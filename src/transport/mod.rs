pub(crate) mod http;
pub(crate) mod local;
pub(crate) mod remote;
mod traits;

pub use http::HttpTransport;
pub use local::LocalProcessTransport;
pub use remote::McpHttpTransport;
pub use traits::Transport;

use crate::config::ConnectorConfig;
use crate::connector::{Endpoint, TransportKind};

/// Build the transport matching the endpoint's kind
pub fn build_transport(endpoint: &Endpoint, config: &ConnectorConfig) -> Box<dyn Transport> {
    match endpoint.kind() {
        TransportKind::Http => Box::new(HttpTransport::new(
            endpoint.address().to_string(),
            config.connect_timeout(),
        )),
        TransportKind::LocalProcess => Box::new(LocalProcessTransport::new(
            endpoint.clone(),
            config.connect_timeout(),
        )),
        TransportKind::McpHttp => Box::new(McpHttpTransport::new(
            endpoint.address().to_string(),
            config.connect_timeout(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_transport_matches_kind() {
        let config = ConnectorConfig::default();

        let http = build_transport(&Endpoint::http("http://127.0.0.1:8000"), &config);
        assert_eq!(http.kind(), TransportKind::Http);

        let local = build_transport(&Endpoint::local_process("tool-bridge"), &config);
        assert_eq!(local.kind(), TransportKind::LocalProcess);

        let remote = build_transport(&Endpoint::mcp_http("http://127.0.0.1:8000/mcp"), &config);
        assert_eq!(remote.kind(), TransportKind::McpHttp);
    }
}
