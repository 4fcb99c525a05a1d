//! Persistent WebSocket connection with JSON-RPC request correlation.
//!
//! One writer task drains an outbound queue into the socket; one reader task
//! settles pending calls, routes notifications, and reports lifecycle events.
//! Because a single task reads, events reach the observer in arrival order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use session::{
    CloseInfo, DispatchMode, NotificationHandler, RequestId, RpcProtocol, TransportError,
    TransportEvent, TransportObserver,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::{frame::CloseFrame, Message};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, trace, warn};

use crate::frames::{self, Inbound};

type Reply = Result<Value, TransportError>;

/// Calls awaiting an answer, plus the ID counter.
#[derive(Default)]
struct CallTable {
    last_id: u64,
    pending: HashMap<RequestId, oneshot::Sender<Reply>>,
    closed: bool,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<CallTable>,
    handlers: RwLock<HashMap<String, (DispatchMode, NotificationHandler)>>,
}

impl Shared {
    fn lock_calls(&self) -> MutexGuard<'_, CallTable> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, id: RequestId, reply: Reply) {
        let sender = self.lock_calls().pending.remove(&id);
        match sender {
            Some(sender) => {
                if sender.send(reply).is_err() {
                    trace!(%id, "Caller stopped waiting before the answer arrived");
                }
            }
            None => warn!(%id, "Answer for unknown request"),
        }
    }

    /// Fails every pending call and refuses new ones.
    fn shut(&self) {
        let drained: Vec<_> = {
            let mut table = self.lock_calls();
            table.closed = true;
            table.pending.drain().collect()
        };
        if !drained.is_empty() {
            debug!(count = drained.len(), "Failing calls still in flight");
        }
        for (_, sender) in drained {
            let _ = sender.send(Err(TransportError::ConnectionClosed));
        }
    }

    fn deliver(&self, method: &str, params: Value) {
        let entry = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(method)
            .cloned();
        let Some((mode, handler)) = entry else {
            debug!(method, "Notification with no registered handler dropped");
            return;
        };

        match (mode, params) {
            (_, Value::Null) => handler(&[]),
            (DispatchMode::Positional, Value::Array(args)) => handler(&args),
            (_, other) => handler(&[other]),
        }
    }

    fn handle_frame(&self, bytes: &[u8]) {
        match frames::decode(bytes) {
            Ok(Inbound::Response { id, result }) => self.settle(id, result),
            Ok(Inbound::Notification { method, params }) => self.deliver(&method, params),
            Err(err) => warn!(error = %err, "Dropping unreadable frame"),
        }
    }
}

/// JSON-RPC 2.0 client bound to one WebSocket connection.
///
/// Obtained from [`crate::WsConnector`] or [`WsRpcClient::spawn`].
pub struct WsRpcClient {
    url: String,
    outbound: mpsc::UnboundedSender<Message>,
    shared: Arc<Shared>,
}

impl WsRpcClient {
    /// Takes over an established WebSocket and starts its reader and writer
    /// tasks. Must be called within a Tokio runtime.
    pub fn spawn<S>(
        url: impl Into<String>,
        stream: WebSocketStream<S>,
        observer: Arc<dyn TransportObserver>,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let url = url.into();
        let shared = Arc::new(Shared::default());
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let (mut sink, mut source) = stream.split();

        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(err) = sink.send(message).await {
                    debug!(error = %err, "WebSocket write failed");
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let reader_shared = Arc::clone(&shared);
        let reader_url = url.clone();
        tokio::spawn(async move {
            let close = loop {
                match source.next().await {
                    Some(Ok(Message::Text(text))) => reader_shared.handle_frame(text.as_bytes()),
                    Some(Ok(Message::Binary(bytes))) => reader_shared.handle_frame(&bytes),
                    Some(Ok(Message::Close(frame))) => break close_info(frame),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        observer.on_transport_event(TransportEvent::Error(TransportError::Io {
                            message: err.to_string(),
                        }));
                        break CloseInfo::default();
                    }
                    None => break CloseInfo::default(),
                }
            };

            reader_shared.shut();
            writer.abort();
            info!(url = %reader_url, code = ?close.code, "WebSocket closed");
            observer.on_transport_event(TransportEvent::Closed(close));
        });

        Self {
            url,
            outbound,
            shared,
        }
    }

    /// URL this client is connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of calls still waiting for an answer.
    pub fn pending_calls(&self) -> usize {
        self.shared.lock_calls().pending.len()
    }

    fn register(&self, sender: oneshot::Sender<Reply>) -> Result<RequestId, TransportError> {
        let mut table = self.shared.lock_calls();
        if table.closed {
            return Err(TransportError::ConnectionClosed);
        }
        table.last_id += 1;
        let id = RequestId::new(table.last_id);
        table.pending.insert(id, sender);
        Ok(id)
    }
}

/// Pending-table entry owned by one in-flight call.
struct PendingCall<'a> {
    shared: &'a Shared,
    id: RequestId,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if self.shared.lock_calls().pending.remove(&self.id).is_some() {
            trace!(id = %self.id, "Call abandoned before its answer arrived");
        }
    }
}

#[async_trait]
impl RpcProtocol for WsRpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let (sender, receiver) = oneshot::channel();
        let id = self.register(sender)?;
        // Removes the entry however this future ends, including when the
        // caller drops it before the answer arrives.
        let _pending = PendingCall {
            shared: &self.shared,
            id,
        };

        let frame = frames::encode_request(id, method, params)?;
        if self.outbound.send(Message::Text(frame)).is_err() {
            return Err(TransportError::ConnectionClosed);
        }
        trace!(%id, method, "Request sent");

        receiver
            .await
            .unwrap_or(Err(TransportError::ConnectionClosed))
    }

    fn dispatch(&self, method: &str, mode: DispatchMode, handler: NotificationHandler) {
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method.to_string(), (mode, handler));
    }

    fn registered_methods(&self) -> Vec<String> {
        self.shared
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    async fn close(&self) {
        if self.outbound.send(Message::Close(None)).is_err() {
            debug!(url = %self.url, "Close requested on a connection that is already down");
        }
    }
}

impl Drop for WsRpcClient {
    fn drop(&mut self) {
        let _ = self.outbound.send(Message::Close(None));
    }
}

impl std::fmt::Debug for WsRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsRpcClient")
            .field("url", &self.url)
            .field("pending_calls", &self.pending_calls())
            .finish_non_exhaustive()
    }
}

fn close_info(frame: Option<CloseFrame<'static>>) -> CloseInfo {
    match frame {
        Some(frame) => CloseInfo {
            code: Some(u16::from(frame.code)),
            reason: frame.reason.into_owned(),
        },
        None => CloseInfo::default(),
    }
}
