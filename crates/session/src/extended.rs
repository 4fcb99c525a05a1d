//! The extended call surface, available after [`crate::Session::activate`].

use async_trait::async_trait;
use serde_json::Value;

use crate::client::BaseClient;
use crate::handlers::EventHandlers;
use crate::ports::NotificationHandler;
use crate::{CallError, EventName};

/// Methods and event handlers available once capability is extended.
///
/// The only way to obtain an implementor is [`crate::Session::activate`],
/// so holding an `ExtendedClient` proves inbound routing is in place.
#[async_trait]
pub trait ExtendedClient: BaseClient {
    /// The handler table inbound notifications are routed through.
    fn event_handlers(&self) -> &EventHandlers;

    /// Replaces the handler for `event`. Takes effect for the next
    /// notification.
    fn set_event_handler(&self, event: EventName, handler: NotificationHandler) {
        self.event_handlers().set(event, handler);
    }

    /// Returns the handler currently installed for `event`.
    fn event_handler(&self, event: EventName) -> NotificationHandler {
        self.event_handlers().get(event)
    }

    // -----------------------------------------------------------------------
    // Session and events
    // -----------------------------------------------------------------------

    /// Asks the remote side to start (or stop) sending notifications.
    ///
    /// Activation only prepares local routing; nothing is pushed until this
    /// has been called with `true`.
    async fn enable_events(&self, enable: bool) -> Result<Value, CallError> {
        self.adapter().invoke("EnableEvents", params![enable]).await
    }

    /// Requests `OnVariableChanged` notifications for `name`, sampled every
    /// `interval_ms` milliseconds.
    async fn subscribe_variable(&self, name: &str, interval_ms: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("SubscribeVariable", params![name, interval_ms])
            .await
    }

    async fn unsubscribe_variable(&self, name: &str) -> Result<Value, CallError> {
        self.adapter()
            .invoke("UnsubscribeVariable", params![name])
            .await
    }

    /// Asks the remote application to exit.
    async fn exit(&self) -> Result<Value, CallError> {
        self.adapter().invoke("Exit", params![]).await
    }

    // -----------------------------------------------------------------------
    // Files on the remote host
    // -----------------------------------------------------------------------

    /// Opens a file on the remote host; `mode` follows `fopen` conventions.
    async fn local_file_open(&self, path: &str, mode: &str) -> Result<Value, CallError> {
        self.adapter()
            .invoke("LocalFileOpen", params![path, mode])
            .await
    }

    async fn local_file_close(&self, handle: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("LocalFileClose", params![handle])
            .await
    }

    async fn local_file_read_string(&self, handle: u32, max_len: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("LocalFileReadString", params![handle, max_len])
            .await
    }

    async fn local_file_write_string(&self, handle: u32, text: &str) -> Result<Value, CallError> {
        self.adapter()
            .invoke("LocalFileWriteString", params![handle, text])
            .await
    }

    // -----------------------------------------------------------------------
    // Symbols
    // -----------------------------------------------------------------------

    /// Defines a script symbol of `size` bytes at `address`.
    async fn define_symbol(&self, name: &str, address: &str, size: u32) -> Result<Value, CallError> {
        self.adapter()
            .invoke("DefineSymbol", params![name, address, size])
            .await
    }

    async fn delete_all_script_symbols(&self) -> Result<Value, CallError> {
        self.adapter()
            .invoke("DeleteAllScriptSymbols", params![])
            .await
    }

    /// Reloads debug symbols from `path` (an ELF or map file).
    async fn reload_symbols_file(&self, path: &str) -> Result<Value, CallError> {
        self.adapter()
            .invoke("ReloadSymbolsFile", params![path])
            .await
    }

    async fn get_symbol_list(&self) -> Result<Value, CallError> {
        self.adapter().invoke("GetSymbolList", params![]).await
    }

    // -----------------------------------------------------------------------
    // Stimulators
    // -----------------------------------------------------------------------

    async fn start_stimulators(&self, names: &[String]) -> Result<Value, CallError> {
        self.adapter()
            .invoke("StartStimulators", params![names])
            .await
    }

    async fn stop_stimulators(&self, names: &[String]) -> Result<Value, CallError> {
        self.adapter()
            .invoke("StopStimulators", params![names])
            .await
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    async fn project_open(&self, path: &str) -> Result<Value, CallError> {
        self.adapter().invoke("ProjectOpen", params![path]).await
    }

    /// Saves the project, to `path` when given, otherwise in place.
    async fn project_save(&self, path: Option<&str>) -> Result<Value, CallError> {
        self.adapter().invoke("ProjectSave", params![path]).await
    }

    async fn project_close(&self) -> Result<Value, CallError> {
        self.adapter().invoke("ProjectClose", params![]).await
    }

    async fn get_project_info(&self) -> Result<Value, CallError> {
        self.adapter().invoke("GetProjectInfo", params![]).await
    }
}
