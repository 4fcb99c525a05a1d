//! Handler slots for server-pushed notifications.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::ports::NotificationHandler;
use crate::{EventName, SessionId};

/// One slot per [`EventName`], each holding the handler that receives the
/// next matching notification.
///
/// Slots are never empty: events with no caller-supplied handler get a stub
/// that writes a log record.
pub struct EventHandlers {
    slots: [RwLock<NotificationHandler>; 4],
}

impl EventHandlers {
    /// Builds the table from caller-supplied handlers, stubbing the rest.
    pub fn new(
        session_id: SessionId,
        configured: impl IntoIterator<Item = (EventName, NotificationHandler)>,
    ) -> Self {
        let slots = EventName::ALL.map(|event| RwLock::new(logging_stub(session_id, event)));
        let table = Self { slots };
        for (event, handler) in configured {
            table.set(event, handler);
        }
        table
    }

    /// Replaces the handler for `event`. The next notification for that
    /// event goes to `handler`.
    pub fn set(&self, event: EventName, handler: NotificationHandler) {
        let mut slot = self.slots[event.index()]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = handler;
    }

    /// Returns the handler currently installed for `event`.
    pub fn get(&self, event: EventName) -> NotificationHandler {
        let slot = self.slots[event.index()]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&slot)
    }

    /// Delivers one notification to the current handler for `event`.
    ///
    /// The slot lock is released before the handler runs, so a handler may
    /// replace its own slot.
    pub fn deliver(&self, event: EventName, args: &[Value]) {
        let handler = self.get(event);
        handler(args);
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers").finish_non_exhaustive()
    }
}

fn logging_stub(session_id: SessionId, event: EventName) -> NotificationHandler {
    Arc::new(move |args: &[Value]| {
        debug!(%session_id, %event, arg_count = args.len(), "Notification received with no handler assigned");
    })
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
