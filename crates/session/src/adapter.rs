//! The single path from a domain method to the remote service.
//!
//! [`RequestAdapter::invoke`] issues one call through the protocol
//! collaborator and reduces the answer to `Ok(data)` or
//! `Err(CallError::Remote(error))`. Transport failures take the side channel.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::lifecycle::LifecycleCallbacks;
use crate::ports::RpcProtocol;
use crate::{CallError, MethodName, Outcome, ServerError, SessionId, TransportFailureMode};

/// Turns every logical call into one correlated round trip.
///
/// No retries, no timeouts, no queueing: each `invoke` is exactly one call
/// on the protocol collaborator.
pub struct RequestAdapter {
    session_id: SessionId,
    protocol: Arc<dyn RpcProtocol>,
    callbacks: LifecycleCallbacks,
    failure_mode: TransportFailureMode,
}

impl RequestAdapter {
    pub(crate) fn new(
        session_id: SessionId,
        protocol: Arc<dyn RpcProtocol>,
        callbacks: LifecycleCallbacks,
        failure_mode: TransportFailureMode,
    ) -> Self {
        Self {
            session_id,
            protocol,
            callbacks,
            failure_mode,
        }
    }

    /// Calls `method` with positional `args` and returns the `data` member of
    /// a successful answer.
    ///
    /// # Errors
    ///
    /// - [`CallError::Remote`] with the service's error descriptor when the
    ///   answer reports failure.
    /// - [`CallError::Transport`] when no answer was obtained and the session
    ///   runs with [`TransportFailureMode::ReportAndReject`]. With
    ///   [`TransportFailureMode::ReportOnly`] the returned future never
    ///   completes in that case; the failure is visible only through the
    ///   `on_server_error` callback.
    /// - [`CallError::EmptyMethod`] when `method` is blank.
    #[instrument(
        name = "invoke",
        skip(self, args),
        fields(session_id = %self.session_id, arg_count = args.len())
    )]
    pub async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, CallError> {
        let method_name = MethodName::new(method).ok_or(CallError::EmptyMethod)?;

        debug!("Issuing call");
        let error = match self.protocol.call(method, args).await {
            Ok(envelope) => {
                return match Outcome::from_envelope(envelope) {
                    Outcome::Success(data) => {
                        debug!("Call succeeded");
                        Ok(data)
                    }
                    Outcome::Failure(err) => {
                        debug!(error = %err, "Call reported failure");
                        Err(CallError::Remote(err))
                    }
                };
            }
            Err(error) => error,
        };

        let server_error = ServerError {
            method: method_name,
            error,
        };
        self.callbacks.server_error(&server_error);

        match self.failure_mode {
            TransportFailureMode::ReportOnly => {
                debug!("Call abandoned after transport failure");
                std::future::pending().await
            }
            TransportFailureMode::ReportAndReject => Err(CallError::Transport(server_error)),
        }
    }

    /// Like [`RequestAdapter::invoke`], deserialising the data into `T`.
    pub async fn invoke_as<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, CallError> {
        let data = self.invoke(method, args).await?;
        serde_json::from_value(data).map_err(|source| CallError::Decode {
            method: method.to_string(),
            source,
        })
    }

    /// The session this adapter belongs to.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The treatment applied to transport failures.
    pub fn failure_mode(&self) -> TransportFailureMode {
        self.failure_mode
    }

    pub(crate) fn protocol(&self) -> &Arc<dyn RpcProtocol> {
        &self.protocol
    }
}

impl std::fmt::Debug for RequestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAdapter")
            .field("session_id", &self.session_id)
            .field("failure_mode", &self.failure_mode)
            .finish_non_exhaustive()
    }
}
