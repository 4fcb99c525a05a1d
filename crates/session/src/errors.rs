//! Error types for the session core.
//!
//! The taxonomy has three disjoint branches, and each reaches the caller by a
//! different path:
//!
//! - [`CallError::Remote`]: the service answered with `success: false`. This
//!   is the normal failure of a call and is returned from the call itself.
//! - [`TransportError`]: the call never obtained a structured answer. It is
//!   reported on the `on_server_error` side channel; whether the call also
//!   fails is decided by [`crate::TransportFailureMode`].
//! - [`CapabilityError`]: misuse of the session (withdrawing extended
//!   capability). Never produced by a call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MethodName, RemoteError};

// ---------------------------------------------------------------------------
// Transport-level errors
// ---------------------------------------------------------------------------

/// The connection or the correlation protocol failed before a structured
/// answer was obtained.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("Failed to connect to {url}: {message}")]
    Connect {
        /// URL the connection was attempted against.
        url: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The connection handshake did not complete in time.
    #[error("Timed out connecting to {url}")]
    ConnectTimeout {
        /// URL the connection was attempted against.
        url: String,
    },

    /// The connection closed while the call was in flight, or before it was
    /// issued.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The correlation protocol itself rejected the request (e.g. a JSON-RPC
    /// `error` member instead of a `result`).
    #[error("Protocol error {code}: {message}")]
    Rpc {
        /// Protocol-level error code.
        code: i64,
        /// Protocol-level error message.
        message: String,
    },

    /// A frame could not be encoded or decoded.
    #[error("Malformed frame: {message}")]
    Protocol {
        /// Description of the framing problem.
        message: String,
    },

    /// Low-level I/O failure on the underlying stream.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O failure.
        message: String,
    },
}

/// A transport failure attributed to the call that suffered it.
///
/// This is the payload of the `on_server_error` side channel.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Call to {method} failed in transport: {error}")]
pub struct ServerError {
    /// The remote procedure that was being called.
    pub method: MethodName,
    /// What went wrong.
    pub error: TransportError,
}

// ---------------------------------------------------------------------------
// Call errors
// ---------------------------------------------------------------------------

/// Failure of a single call made through [`crate::RequestAdapter`].
#[derive(Debug, Error)]
pub enum CallError {
    /// The service answered and reported failure. Carries the service's
    /// error descriptor exactly as received.
    #[error("Remote call failed: {0}")]
    Remote(RemoteError),

    /// The call failed in transport. Only returned when the session runs with
    /// [`crate::TransportFailureMode::ReportAndReject`].
    #[error(transparent)]
    Transport(#[from] ServerError),

    /// The returned data did not match the type requested by the caller.
    #[error("Failed to decode result of {method}: {source}")]
    Decode {
        /// The remote procedure that was called.
        method: String,
        /// Deserialisation failure.
        #[source]
        source: serde_json::Error,
    },

    /// The method name was empty.
    #[error("Method name must not be empty")]
    EmptyMethod,
}

impl CallError {
    /// Returns the remote error descriptor if the service reported failure.
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the service answered with `success: false`.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Returns `true` if the call failed in transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

// ---------------------------------------------------------------------------
// Capability misuse
// ---------------------------------------------------------------------------

/// Fatal misuse of the capability latch.
///
/// Capability extension is one-way for the lifetime of a session; asking to
/// withdraw it is a programming error, not a recoverable call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// Deactivation was requested after the session had been extended.
    #[error("Extended capability cannot be withdrawn once activated; open a new session instead")]
    Irreversible,
}

// ---------------------------------------------------------------------------
// Umbrella
// ---------------------------------------------------------------------------

/// Any error the session surface can produce.
///
/// Convenience for callers that want a single error type; the branches remain
/// distinguishable by variant.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A call failed.
    #[error(transparent)]
    Call(#[from] CallError),

    /// The connection could not be established or failed outside of a call.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The capability latch was misused.
    #[error(transparent)]
    Capability(#[from] CapabilityError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
