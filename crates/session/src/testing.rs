//! In-memory protocol collaborator for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::ports::{Connector, NotificationHandler, RpcProtocol, TransportObserver};
use crate::{DispatchMode, EndpointAddress, TransportError, TransportEvent};

/// Answers calls from a script, records everything it is asked to do.
///
/// A call with no scripted reply never completes, like a real call whose
/// answer has not arrived yet.
#[derive(Default)]
pub(crate) struct FakeProtocol {
    script: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    handlers: Mutex<HashMap<String, (DispatchMode, NotificationHandler)>>,
    registrations: Mutex<Vec<String>>,
    closed: Mutex<bool>,
}

impl FakeProtocol {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues the raw envelope (or transport failure) for the next call.
    pub(crate) fn reply(&self, reply: Result<Value, TransportError>) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Every `dispatch` call made, in order, including replacements.
    pub(crate) fn registrations(&self) -> Vec<String> {
        self.registrations.lock().unwrap().clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    /// Simulates a server-pushed notification. Returns `false` if no handler
    /// is registered for `method`.
    pub(crate) fn notify(&self, method: &str, args: &[Value]) -> bool {
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .get(method)
            .map(|(_, handler)| Arc::clone(handler));
        match handler {
            Some(handler) => {
                handler(args);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RpcProtocol for FakeProtocol {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        let reply = self.script.lock().unwrap().pop_front();
        match reply {
            Some(reply) => reply,
            None => std::future::pending().await,
        }
    }

    fn dispatch(&self, method: &str, mode: DispatchMode, handler: NotificationHandler) {
        self.registrations.lock().unwrap().push(method.to_string());
        self.handlers
            .lock()
            .unwrap()
            .insert(method.to_string(), (mode, handler));
    }

    fn registered_methods(&self) -> Vec<String> {
        self.handlers.lock().unwrap().keys().cloned().collect()
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

/// Hands out a shared [`FakeProtocol`] and keeps the observer so tests can
/// raise lifecycle events.
pub(crate) struct FakeConnector {
    pub(crate) protocol: Arc<FakeProtocol>,
    failure: Option<TransportError>,
    observer: Mutex<Option<Arc<dyn TransportObserver>>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self {
            protocol: FakeProtocol::new(),
            failure: None,
            observer: Mutex::new(None),
        }
    }

    pub(crate) fn failing(error: TransportError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    pub(crate) fn emit(&self, event: TransportEvent) {
        let observer = self.observer.lock().unwrap().clone();
        if let Some(observer) = observer {
            observer.on_transport_event(event);
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _address: &EndpointAddress,
        observer: Arc<dyn TransportObserver>,
    ) -> Result<Arc<dyn RpcProtocol>, TransportError> {
        if let Some(error) = &self.failure {
            observer.on_transport_event(TransportEvent::Error(error.clone()));
            return Err(error.clone());
        }
        observer.on_transport_event(TransportEvent::Opened);
        *self.observer.lock().unwrap() = Some(observer);
        Ok(Arc::clone(&self.protocol) as Arc<dyn RpcProtocol>)
    }
}
