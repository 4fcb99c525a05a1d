//! JSON-RPC 2.0 frame encoding and classification.
//!
//! Outbound frames are always requests with positional parameters. Inbound
//! frames are either responses (they carry an `id` and no `method`) or
//! notifications (they carry a `method`).

use serde::Deserialize;
use serde_json::{json, Value};
use session::{RequestId, TransportError};

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inbound {
    /// Answer to an earlier request. `Err` when the frame carried a JSON-RPC
    /// `error` member.
    Response {
        id: RequestId,
        result: Result<Value, TransportError>,
    },
    /// Server-pushed notification.
    Notification { method: String, params: Value },
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RawError>,
}

#[derive(Debug, Deserialize)]
struct RawError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Encodes one request frame.
pub(crate) fn encode_request(
    id: RequestId,
    method: &str,
    params: Vec<Value>,
) -> Result<String, TransportError> {
    let frame = json!({
        "jsonrpc": "2.0",
        "id": id.as_u64(),
        "method": method,
        "params": params,
    });
    serde_json::to_string(&frame).map_err(|err| TransportError::Protocol {
        message: err.to_string(),
    })
}

/// Classifies one inbound frame.
///
/// A frame carrying both `id` and `method` is a request from the server; it
/// is handled like a notification and never answered.
pub(crate) fn decode(bytes: &[u8]) -> Result<Inbound, TransportError> {
    let raw: RawFrame = serde_json::from_slice(bytes).map_err(|err| TransportError::Protocol {
        message: err.to_string(),
    })?;

    if let Some(method) = raw.method {
        return Ok(Inbound::Notification {
            method,
            params: raw.params.unwrap_or(Value::Null),
        });
    }

    let Some(id) = raw.id else {
        return Err(TransportError::Protocol {
            message: "frame has neither id nor method".to_string(),
        });
    };

    let result = match raw.error {
        Some(error) => Err(TransportError::Rpc {
            code: error.code,
            message: error.message,
        }),
        None => Ok(raw.result.unwrap_or(Value::Null)),
    };

    Ok(Inbound::Response {
        id: RequestId::new(id),
        result,
    })
}

#[cfg(test)]
#[path = "frames_tests.rs"]
mod tests;
