//! Port traits implemented by infrastructure crates.
//!
//! The session core never touches a socket. It talks to a protocol
//! collaborator through [`RpcProtocol`], obtains one through [`Connector`],
//! and is told about connection lifecycle through [`TransportObserver`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{DispatchMode, EndpointAddress, TransportError, TransportEvent};

/// Callback invoked for an inbound notification.
///
/// Receives the notification arguments as shaped by the [`DispatchMode`] the
/// handler was registered with.
pub type NotificationHandler = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// A correlated request/response channel to the remote service.
///
/// Implementations own request IDs, framing, and the connection. Each `call`
/// is exactly one round trip; implementations do not retry.
#[async_trait]
pub trait RpcProtocol: Send + Sync {
    /// Issues one call and waits for the raw result envelope.
    ///
    /// Returns `Err` only when no structured answer was obtained. An answer
    /// that reports failure inside its envelope is still `Ok`.
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError>;

    /// Installs the handler for inbound notifications named `method`,
    /// replacing any handler previously installed for that name.
    fn dispatch(&self, method: &str, mode: DispatchMode, handler: NotificationHandler);

    /// Names that currently have an inbound handler.
    fn registered_methods(&self) -> Vec<String>;

    /// Closes the connection. Pending calls fail with
    /// [`TransportError::ConnectionClosed`].
    async fn close(&self);
}

/// Receives transport lifecycle events.
///
/// Protocol collaborators call this from a single context, one event at a
/// time, in the order the transport produced them.
pub trait TransportObserver: Send + Sync {
    /// Handles one lifecycle event.
    fn on_transport_event(&self, event: TransportEvent);
}

/// Opens a connection and returns the protocol collaborator bound to it.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to `address`.
    ///
    /// Must report [`TransportEvent::Opened`] to `observer` before returning
    /// `Ok`, and [`TransportEvent::Error`] before returning `Err`.
    async fn connect(
        &self,
        address: &EndpointAddress,
        observer: Arc<dyn TransportObserver>,
    ) -> Result<Arc<dyn RpcProtocol>, TransportError>;
}
