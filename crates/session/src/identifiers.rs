//! Newtype identifiers.
//!
//! Every concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`MethodName`] with an [`EndpointAddress`] even though both are strings
//! under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| format!("{} must not be empty", stringify!($name)))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one client session (one connection to the remote service).
///
/// Generated fresh for every [`crate::Session`]; recorded on every span the
/// session emits so all activity from a single connection can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random session identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: integer-backed
// ---------------------------------------------------------------------------

/// Correlation identifier assigned by a protocol collaborator to one request.
///
/// Only meaningful to the collaborator that issued it; the session core never
/// inspects request IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a request identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// Name of a remote procedure (e.g. `"GetAppVersion"`).
    ///
    /// The adapter does not check that the name exists on the remote side;
    /// an unknown name is reported by the service like any other failure.
    MethodName
}

string_id! {
    /// Location of the remote service in `host:port` form.
    ///
    /// A value that already carries a `ws://` or `wss://` scheme is accepted
    /// and used verbatim by [`EndpointAddress::ws_url`].
    EndpointAddress
}

/// Port the remote service listens on when none is configured.
pub const DEFAULT_PORT: u16 = 41000;

impl EndpointAddress {
    /// Returns the WebSocket URL for this address.
    pub fn ws_url(&self) -> String {
        if self.0.starts_with("ws://") || self.0.starts_with("wss://") {
            self.0.clone()
        } else {
            format!("ws://{}", self.0)
        }
    }
}

impl Default for EndpointAddress {
    fn default() -> Self {
        Self(format!("localhost:{DEFAULT_PORT}"))
    }
}

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;
