//! Lifecycle callbacks and their forwarding from the transport.
//!
//! Every slot is filled when the session is built: with the caller's closure
//! if one was supplied, otherwise with a stub that writes a log record.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ports::TransportObserver;
use crate::{CloseInfo, ServerError, SessionId, TransportError, TransportEvent};

/// Called once when the connection opens.
pub type OpenCallback = Arc<dyn Fn() + Send + Sync>;

/// Called once when the connection closes.
pub type CloseCallback = Arc<dyn Fn(&CloseInfo) + Send + Sync>;

/// Called for every error the transport reports.
pub type ErrorCallback = Arc<dyn Fn(&TransportError) + Send + Sync>;

/// Called for every call that fails in transport.
pub type ServerErrorCallback = Arc<dyn Fn(&ServerError) + Send + Sync>;

/// The user-facing lifecycle slots of one session.
#[derive(Clone)]
pub struct LifecycleCallbacks {
    pub(crate) on_open: OpenCallback,
    pub(crate) on_close: CloseCallback,
    pub(crate) on_error: ErrorCallback,
    pub(crate) on_server_error: ServerErrorCallback,
}

impl LifecycleCallbacks {
    /// Creates a set of logging stubs tagged with `session_id`.
    pub fn logging(session_id: SessionId) -> Self {
        Self {
            on_open: Arc::new(move || info!(%session_id, "Connection opened")),
            on_close: Arc::new(move |close: &CloseInfo| {
                info!(%session_id, code = ?close.code, reason = %close.reason, "Connection closed");
            }),
            on_error: Arc::new(move |err: &TransportError| {
                warn!(%session_id, error = %err, "Transport error");
            }),
            on_server_error: Arc::new(move |err: &ServerError| {
                warn!(%session_id, method = %err.method, error = %err.error, "Call failed in transport");
            }),
        }
    }

    pub(crate) fn server_error(&self, err: &ServerError) {
        (self.on_server_error)(err);
    }
}

impl std::fmt::Debug for LifecycleCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleCallbacks").finish_non_exhaustive()
    }
}

/// Routes transport events to the lifecycle slots.
///
/// Each event produces exactly one callback invocation, on the caller's
/// context, before this method returns.
pub struct LifecycleForwarder {
    session_id: SessionId,
    callbacks: LifecycleCallbacks,
}

impl LifecycleForwarder {
    pub(crate) fn new(session_id: SessionId, callbacks: LifecycleCallbacks) -> Self {
        Self {
            session_id,
            callbacks,
        }
    }
}

impl TransportObserver for LifecycleForwarder {
    fn on_transport_event(&self, event: TransportEvent) {
        debug!(session_id = %self.session_id, event = event.kind(), "Forwarding transport event");
        match event {
            TransportEvent::Opened => (self.callbacks.on_open)(),
            TransportEvent::Closed(close) => (self.callbacks.on_close)(&close),
            TransportEvent::Error(err) => (self.callbacks.on_error)(&err),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
