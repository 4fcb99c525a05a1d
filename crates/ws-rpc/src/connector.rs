//! Opens WebSocket connections for new sessions.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use session::{
    Connector, EndpointAddress, RpcProtocol, SessionConfig, TransportError, TransportEvent,
    TransportObserver,
};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tracing::{info, warn};

use crate::WsRpcClient;

/// Handshake bound used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Connector`] that dials `ws://host:port` and hands the socket to a
/// [`WsRpcClient`].
///
/// The connect timeout bounds the handshake only; calls made on the
/// resulting connection have no timeout.
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Uses the connect timeout from loaded configuration.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new().with_connect_timeout(Duration::from_secs(config.connect_timeout_secs))
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        address: &EndpointAddress,
        observer: Arc<dyn TransportObserver>,
    ) -> Result<Arc<dyn RpcProtocol>, TransportError> {
        let url = address.ws_url();
        info!(%url, "Connecting");

        let attempt = match timeout(self.connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((stream, _response))) => Ok(stream),
            Ok(Err(err)) => Err(TransportError::Connect {
                url: url.clone(),
                message: err.to_string(),
            }),
            Err(_) => Err(TransportError::ConnectTimeout { url: url.clone() }),
        };

        match attempt {
            Ok(stream) => {
                observer.on_transport_event(TransportEvent::Opened);
                Ok(Arc::new(WsRpcClient::spawn(url, stream, observer)))
            }
            Err(err) => {
                warn!(error = %err, "Connection failed");
                observer.on_transport_event(TransportEvent::Error(err.clone()));
                Err(err)
            }
        }
    }
}
