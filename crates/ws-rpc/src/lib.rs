//! fmlink protocol collaborator over WebSocket.
//!
//! Implements the [`session::RpcProtocol`] and [`session::Connector`] traits
//! with JSON-RPC 2.0 frames carried on one persistent WebSocket connection.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Request IDs, framing, the socket, and its reader and
//! writer tasks all live here. The [`session`] crate sees only the traits.
//!
//! ## Wire format
//!
//! - Request: `{"jsonrpc":"2.0","id":N,"method":"GetAppVersion","params":[]}`
//! - Response: `{"jsonrpc":"2.0","id":N,"result":{"success":true,"data":"3.0"}}`.
//!   The `result` is handed to the session unchanged; a JSON-RPC `error`
//!   member becomes [`session::TransportError::Rpc`].
//! - Notification: `{"jsonrpc":"2.0","method":"OnRecorderDone","params":[]}`
//!
//! ## Not handled here
//!
//! Reconnection and back-off. A dropped connection fails every pending call
//! with [`session::TransportError::ConnectionClosed`]; callers build a new
//! session to reconnect.

mod client;
mod connector;
mod frames;

pub use client::WsRpcClient;
pub use connector::{WsConnector, DEFAULT_CONNECT_TIMEOUT};
