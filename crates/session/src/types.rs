//! Shared value types for the session core.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! behaviour: the outcome envelope knows how to normalise itself, the event
//! registry knows its wire names, and the configuration knows its defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EndpointAddress, TransportError};

// ---------------------------------------------------------------------------
// Call outcomes
// ---------------------------------------------------------------------------

/// Error descriptor returned by the remote service with `success: false`.
///
/// Kept as the exact JSON value received; accessors read the conventional
/// fields without altering the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteError(Value);

impl RemoteError {
    /// Wraps a raw error descriptor.
    pub fn new(descriptor: Value) -> Self {
        Self(descriptor)
    }

    /// Returns the descriptor exactly as received.
    pub fn descriptor(&self) -> &Value {
        &self.0
    }

    /// Consumes the error, returning the raw descriptor.
    pub fn into_descriptor(self) -> Value {
        self.0
    }

    /// Returns the `message` field, if the descriptor has one.
    pub fn message(&self) -> Option<&str> {
        self.0.get("msg").or_else(|| self.0.get("message")).and_then(Value::as_str)
    }

    /// Returns the numeric `code` field, if the descriptor has one.
    pub fn code(&self) -> Option<i64> {
        self.0.get("code").and_then(Value::as_i64)
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{message}"),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Normalised result of one remote call.
///
/// The remote service wraps every answer in an envelope of the form
/// `{ "success": true, "data": .. }` or `{ "success": false, "error": .. }`.
/// [`Outcome::from_envelope`] reduces that envelope to one of two branches.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The call succeeded; carries the `data` member.
    Success(Value),
    /// The call failed; carries the `error` member.
    Failure(RemoteError),
}

impl Outcome {
    /// Normalises a raw envelope.
    ///
    /// Only a boolean `true` in `success` counts as success. A missing `data`
    /// on success and a missing `error` on failure both become `null`. An
    /// envelope that is not a JSON object is a failure with a `null` error.
    pub fn from_envelope(envelope: Value) -> Self {
        let Value::Object(mut fields) = envelope else {
            return Self::Failure(RemoteError::new(Value::Null));
        };

        if matches!(fields.get("success"), Some(Value::Bool(true))) {
            Self::Success(fields.remove("data").unwrap_or(Value::Null))
        } else {
            Self::Failure(RemoteError::new(
                fields.remove("error").unwrap_or(Value::Null),
            ))
        }
    }

    /// Returns `true` for the success branch.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into a `Result`, success data on the `Ok` side.
    pub fn into_result(self) -> Result<Value, RemoteError> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(err) => Err(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport lifecycle
// ---------------------------------------------------------------------------

/// Details of a connection close.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CloseInfo {
    /// Close code sent by the peer, when one was received.
    pub code: Option<u16>,
    /// Close reason sent by the peer; empty when none was given.
    pub reason: String,
}

/// A lifecycle signal raised by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection is established and calls may be issued.
    Opened,
    /// The connection has closed. No further events follow.
    Closed(CloseInfo),
    /// The transport reported an error.
    Error(TransportError),
}

impl TransportEvent {
    /// Short label used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opened => "open",
            Self::Closed(_) => "close",
            Self::Error(_) => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Capability extension
// ---------------------------------------------------------------------------

/// Whether the session exposes only the base surface or the extended one.
///
/// Moves from [`CapabilityState::Base`] to [`CapabilityState::Extended`] at
/// most once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityState {
    /// Base methods only; no inbound events are routed.
    #[default]
    Base,
    /// Extension methods available and inbound events routed to handlers.
    Extended,
}

/// Server-pushed notifications routed once the session is extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// A target board was detected on the open communication port.
    #[serde(rename = "OnBoardDetected")]
    BoardDetected,
    /// The communication port was opened or closed.
    #[serde(rename = "OnCommPortStateChanged")]
    CommPortStateChanged,
    /// A subscribed variable changed value.
    #[serde(rename = "OnVariableChanged")]
    VariableChanged,
    /// A recorder finished sampling.
    #[serde(rename = "OnRecorderDone")]
    RecorderDone,
}

impl EventName {
    /// Every event, in registration order.
    pub const ALL: [EventName; 4] = [
        EventName::BoardDetected,
        EventName::CommPortStateChanged,
        EventName::VariableChanged,
        EventName::RecorderDone,
    ];

    /// Returns the method name the service uses for this notification.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BoardDetected => "OnBoardDetected",
            Self::CommPortStateChanged => "OnCommPortStateChanged",
            Self::VariableChanged => "OnVariableChanged",
            Self::RecorderDone => "OnRecorderDone",
        }
    }

    /// Looks an event up by its wire name.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a protocol collaborator hands notification parameters to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DispatchMode {
    /// The `params` array is passed as the argument list.
    #[default]
    Positional,
    /// The whole `params` value is passed as a single argument.
    Named,
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What happens to a call whose transport fails.
///
/// In both modes the failure is first reported on the `on_server_error`
/// side channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportFailureMode {
    /// The call is left pending. Callers that need an upper bound wrap the
    /// call in their own timeout.
    #[default]
    ReportOnly,
    /// The call also fails with [`crate::CallError::Transport`].
    ReportAndReject,
}

/// Session settings that can be loaded from a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the remote service listens.
    pub address: EndpointAddress,
    /// Treatment of calls that fail in transport.
    pub transport_failure_mode: TransportFailureMode,
    /// Upper bound on the connection handshake, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: EndpointAddress::default(),
            transport_failure_mode: TransportFailureMode::default(),
            connect_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
