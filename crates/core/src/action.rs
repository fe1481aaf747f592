//! Actions returned by the resumption state machine.

use crate::RestoreId;
use resumption_messages::HmiMessage;
use resumption_types::{AppId, CorrelationKey, ResumptionResult, WindowId};
use std::time::Duration;

/// Side effects requested by the state machine. The runner performs them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // HMI I/O
    // ═══════════════════════════════════════════════════════════════════════
    /// Hand a message to the transport. A refused request must come back as
    /// [`Event::DispatchFailed`](crate::Event::DispatchFailed).
    SendToHmi { message: HmiMessage },

    /// Fire [`Event::ResponseTimedOut`](crate::Event::ResponseTimedOut) for
    /// `key` after `duration`.
    SetTimer { key: CorrelationKey, duration: Duration },

    /// The response for `key` arrived or is no longer awaited.
    CancelTimer { key: CorrelationKey },

    // ═══════════════════════════════════════════════════════════════════════
    // Caller notifications
    // ═══════════════════════════════════════════════════════════════════════
    /// Invoke the completion callback registered for `restore_id`.
    ResumptionFinished {
        restore_id: RestoreId,
        app_id: AppId,
        result: ResumptionResult,
        info: String,
    },

    /// Drop the completion callback for `restore_id` without invoking it.
    RestoreAbandoned { restore_id: RestoreId, app_id: AppId },

    // ═══════════════════════════════════════════════════════════════════════
    // Application side effects
    // ═══════════════════════════════════════════════════════════════════════
    /// Show windows whose creation was postponed until resumption finished.
    ResumePostponedWindows { app_id: AppId },

    /// Discard windows whose creation was postponed.
    DropPostponedWindows { app_id: AppId },

    /// A window could not be recreated; its display capabilities are stale.
    ResetDisplayCapabilities { app_id: AppId, window_id: WindowId },
}

impl Action {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::SendToHmi { .. } => "SendToHmi",
            Action::SetTimer { .. } => "SetTimer",
            Action::CancelTimer { .. } => "CancelTimer",
            Action::ResumptionFinished { .. } => "ResumptionFinished",
            Action::RestoreAbandoned { .. } => "RestoreAbandoned",
            Action::ResumePostponedWindows { .. } => "ResumePostponedWindows",
            Action::DropPostponedWindows { .. } => "DropPostponedWindows",
            Action::ResetDisplayCapabilities { .. } => "ResetDisplayCapabilities",
        }
    }

    /// The message carried by a `SendToHmi` action.
    pub fn as_hmi_message(&self) -> Option<&HmiMessage> {
        match self {
            Action::SendToHmi { message } => Some(message),
            _ => None,
        }
    }
}
