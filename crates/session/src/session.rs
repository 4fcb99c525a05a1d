//! One client session and its one-way capability latch.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::client::BaseClient;
use crate::extended::ExtendedClient;
use crate::handlers::EventHandlers;
use crate::lifecycle::{LifecycleCallbacks, LifecycleForwarder};
use crate::ports::{Connector, NotificationHandler, RpcProtocol, TransportObserver};
use crate::{
    CapabilityError, CapabilityState, CloseInfo, DispatchMode, EndpointAddress, EventName,
    RequestAdapter, ServerError, SessionConfig, SessionId, TransportError, TransportFailureMode,
};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Collects callbacks and settings, then connects.
///
/// Every callback slot is filled here: anything not supplied is a logging
/// stub. Nothing is inferred later from whether a slot happens to be set.
pub struct SessionBuilder {
    id: SessionId,
    config: SessionConfig,
    callbacks: LifecycleCallbacks,
    handlers: Vec<(EventName, NotificationHandler)>,
}

impl SessionBuilder {
    /// Starts a builder for a session against `address`.
    pub fn new(address: EndpointAddress) -> Self {
        Self::from_config(SessionConfig {
            address,
            ..SessionConfig::default()
        })
    }

    /// Starts a builder from loaded configuration.
    pub fn from_config(config: SessionConfig) -> Self {
        let id = SessionId::new_random();
        Self {
            id,
            config,
            callbacks: LifecycleCallbacks::logging(id),
            handlers: Vec::new(),
        }
    }

    pub fn on_open(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.callbacks.on_open = Arc::new(callback);
        self
    }

    pub fn on_close(mut self, callback: impl Fn(&CloseInfo) + Send + Sync + 'static) -> Self {
        self.callbacks.on_close = Arc::new(callback);
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&TransportError) + Send + Sync + 'static) -> Self {
        self.callbacks.on_error = Arc::new(callback);
        self
    }

    /// Sets the side channel for calls that fail in transport.
    pub fn on_server_error(
        mut self,
        callback: impl Fn(&ServerError) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_server_error = Arc::new(callback);
        self
    }

    /// Sets the initial handler for `event`. It starts receiving
    /// notifications once the session is activated.
    pub fn event_handler(
        mut self,
        event: EventName,
        handler: impl Fn(&[Value]) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.push((event, Arc::new(handler)));
        self
    }

    pub fn transport_failure_mode(mut self, mode: TransportFailureMode) -> Self {
        self.config.transport_failure_mode = mode;
        self
    }

    /// The lifecycle observer the protocol collaborator must report to.
    ///
    /// Only needed with [`SessionBuilder::attach`]; [`SessionBuilder::connect`]
    /// wires it automatically.
    pub fn forwarder(&self) -> Arc<dyn TransportObserver> {
        Arc::new(LifecycleForwarder::new(self.id, self.callbacks.clone()))
    }

    /// Connects through `connector` and returns the session.
    ///
    /// # Errors
    ///
    /// Returns the connector's [`TransportError`]; `on_error` has already been
    /// called with it.
    #[instrument(skip_all, fields(session_id = %self.id, address = %self.config.address))]
    pub async fn connect<C>(self, connector: &C) -> Result<Session, TransportError>
    where
        C: Connector + ?Sized,
    {
        let protocol = connector
            .connect(&self.config.address, self.forwarder())
            .await?;
        info!("Session connected");
        Ok(self.attach(protocol))
    }

    /// Builds the session around an already connected protocol collaborator.
    pub fn attach(self, protocol: Arc<dyn RpcProtocol>) -> Session {
        let handlers = Arc::new(EventHandlers::new(self.id, self.handlers));
        let adapter = RequestAdapter::new(
            self.id,
            protocol,
            self.callbacks,
            self.config.transport_failure_mode,
        );
        Session {
            inner: Arc::new(SessionInner {
                id: self.id,
                address: self.config.address,
                adapter,
                handlers,
                capability: Mutex::new(CapabilityState::Base),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct SessionInner {
    id: SessionId,
    address: EndpointAddress,
    adapter: RequestAdapter,
    handlers: Arc<EventHandlers>,
    capability: Mutex<CapabilityState>,
}

/// A live connection to the remote service exposing the base surface.
///
/// Cloning yields another handle to the same session. A session cannot be
/// reconnected; build a new one instead.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Starts building a session against `address`.
    pub fn builder(address: EndpointAddress) -> SessionBuilder {
        SessionBuilder::new(address)
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    pub fn address(&self) -> &EndpointAddress {
        &self.inner.address
    }

    /// Current position of the capability latch.
    pub fn capability_state(&self) -> CapabilityState {
        *self.lock_capability()
    }

    /// Extends the session and returns the extended surface.
    ///
    /// The first call registers every [`EventName`] with the protocol
    /// collaborator; each registration looks up the handler slot when a
    /// notification arrives, so later handler changes apply to later
    /// notifications. Further calls register nothing and return another
    /// handle to the same extended session.
    #[instrument(skip(self), fields(session_id = %self.inner.id))]
    pub fn activate(&self) -> ExtendedSession {
        let mut state = self.lock_capability();
        match *state {
            CapabilityState::Base => {
                let protocol = self.inner.adapter.protocol();
                for event in EventName::ALL {
                    let handlers = Arc::clone(&self.inner.handlers);
                    protocol.dispatch(
                        event.as_str(),
                        DispatchMode::Positional,
                        Arc::new(move |args: &[Value]| handlers.deliver(event, args)),
                    );
                }
                *state = CapabilityState::Extended;
                info!("Extended capability activated");
            }
            CapabilityState::Extended => debug!("Session already extended"),
        }
        ExtendedSession {
            session: self.clone(),
        }
    }

    /// Requests withdrawal of extended capability.
    ///
    /// Succeeds as a no-op while the session is still in the base state.
    ///
    /// # Errors
    ///
    /// [`CapabilityError::Irreversible`] once the session has been extended.
    /// The state is left unchanged.
    pub fn deactivate(&self) -> Result<(), CapabilityError> {
        match *self.lock_capability() {
            CapabilityState::Base => Ok(()),
            CapabilityState::Extended => {
                error!(session_id = %self.inner.id, "Refusing to withdraw extended capability");
                Err(CapabilityError::Irreversible)
            }
        }
    }

    /// Returns the extended surface if the session has already been activated.
    pub fn extended(&self) -> Option<ExtendedSession> {
        (self.capability_state() == CapabilityState::Extended).then(|| ExtendedSession {
            session: self.clone(),
        })
    }

    /// Closes the connection. Calls still in flight fail in transport.
    pub async fn close(&self) {
        info!(session_id = %self.inner.id, "Closing session");
        self.inner.adapter.protocol().close().await;
    }

    fn lock_capability(&self) -> std::sync::MutexGuard<'_, CapabilityState> {
        self.inner
            .capability
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl BaseClient for Session {
    fn adapter(&self) -> &RequestAdapter {
        &self.inner.adapter
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("address", &self.inner.address)
            .field("capability", &self.capability_state())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Extended session
// ---------------------------------------------------------------------------

/// A session whose capability has been extended.
///
/// Shares all state with the [`Session`] it came from.
#[derive(Clone, Debug)]
pub struct ExtendedSession {
    session: Session,
}

impl ExtendedSession {
    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl BaseClient for ExtendedSession {
    fn adapter(&self) -> &RequestAdapter {
        self.session.adapter()
    }
}

impl ExtendedClient for ExtendedSession {
    fn event_handlers(&self) -> &EventHandlers {
        &self.session.inner.handlers
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
