//! Session core for the fmlink instrument-control client.
//!
//! This crate turns a correlated request/response channel to the remote
//! service into a typed call surface. It owns the rules; infrastructure
//! crates supply the channel.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a protocol collaborator must provide ([`RpcProtocol`],
//! [`Connector`], [`TransportObserver`]); infrastructure crates such as
//! `ws-rpc` define *how*.
//!
//! ## Call flow
//!
//! ```text
//! caller ─► BaseClient method ─► RequestAdapter::invoke ─► RpcProtocol::call
//!                                        │
//!            Ok(data) / Err(Remote) ◄────┤ envelope {success, data|error}
//!                                        │
//!            on_server_error ◄───────────┘ transport failure
//! ```
//!
//! ## Capability extension
//!
//! [`Session::activate`] is a one-way latch. It registers the four inbound
//! events with the protocol collaborator and hands back an
//! [`ExtendedSession`], which adds the [`ExtendedClient`] methods. Asking to
//! withdraw capability afterwards fails with [`CapabilityError::Irreversible`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`SessionId`, `MethodName`, etc.) |
//! | [`types`] | Outcome envelope, lifecycle events, capability state, config |
//! | [`errors`] | Call, transport, and capability error types |
//! | [`ports`] | Traits implemented by infrastructure crates |
//! | [`adapter`] | [`RequestAdapter`], the single path to the service |
//! | [`lifecycle`] | Lifecycle callback slots and their forwarder |
//! | [`handlers`] | Inbound notification handler slots |
//! | [`client`] | [`BaseClient`], the base call surface |
//! | [`extended`] | [`ExtendedClient`], the extended call surface |
//! | [`session`] | [`Session`], [`SessionBuilder`], [`ExtendedSession`] |

// Positional argument list for a remote call.
macro_rules! params {
    ($($arg:expr),* $(,)?) => {
        vec![$(::serde_json::Value::from($arg)),*]
    };
}

pub mod adapter;
pub mod client;
pub mod errors;
pub mod extended;
pub mod handlers;
pub mod identifiers;
pub mod lifecycle;
pub mod ports;
pub mod session;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use adapter::RequestAdapter;
pub use client::BaseClient;
pub use errors::{CallError, CapabilityError, ServerError, SessionError, TransportError};
pub use extended::ExtendedClient;
pub use handlers::EventHandlers;
pub use identifiers::{EndpointAddress, MethodName, RequestId, SessionId, DEFAULT_PORT};
pub use lifecycle::{
    CloseCallback, ErrorCallback, LifecycleCallbacks, LifecycleForwarder, OpenCallback,
    ServerErrorCallback,
};
pub use ports::{Connector, NotificationHandler, RpcProtocol, TransportObserver};
pub use session::{ExtendedSession, Session, SessionBuilder};
pub use types::{
    CapabilityState, CloseInfo, DispatchMode, EventName, Outcome, RemoteError, SessionConfig,
    TransportEvent, TransportFailureMode,
};
