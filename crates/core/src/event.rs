//! Events delivered to the resumption state machine.

use crate::RestoreId;
use resumption_messages::HmiResponse;
use resumption_types::{AppId, CorrelationKey, SavedApplication};

/// Everything that can happen to the resumption engine.
#[derive(Debug, Clone)]
pub enum Event {
    /// A reconnecting application asks for its saved state to be restored.
    RestoreRequested {
        restore_id: RestoreId,
        app_id: AppId,
        saved: Box<SavedApplication>,
    },

    /// The HMI answered a request.
    HmiResponseReceived { response: HmiResponse },

    /// No response arrived for `key` within the configured timeout.
    ResponseTimedOut { key: CorrelationKey },

    /// The transport refused to queue the message sent under `key`.
    DispatchFailed { key: CorrelationKey },

    /// The application went away. Its resumption is abandoned silently.
    ApplicationDisconnected { app_id: AppId },

    /// The HMI session was torn down. Every pending resumption is abandoned.
    SessionClosed,
}

impl Event {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::RestoreRequested { .. } => "RestoreRequested",
            Event::HmiResponseReceived { .. } => "HmiResponseReceived",
            Event::ResponseTimedOut { .. } => "ResponseTimedOut",
            Event::DispatchFailed { .. } => "DispatchFailed",
            Event::ApplicationDisconnected { .. } => "ApplicationDisconnected",
            Event::SessionClosed => "SessionClosed",
        }
    }
}
