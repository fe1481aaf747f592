//! Seams between the runner and the rest of the middleware.

use resumption_messages::HmiMessage;
use resumption_types::{AppId, WindowId};

/// Hands messages to the HMI connection.
pub trait HmiTransport: Send + Sync + 'static {
    /// Queue `message` for the HMI.
    ///
    /// Returns `false` if the message could not be queued. A refused request
    /// fails immediately.
    fn send(&self, message: &HmiMessage) -> bool;
}

/// Application-side effects of finished resumptions.
///
/// Every method defaults to a no-op.
pub trait ResumptionObserver: Send + Sync + 'static {
    /// Show windows whose creation waited for resumption.
    fn resume_postponed_windows(&self, _app_id: AppId) {}

    /// Discard windows whose creation waited for resumption.
    fn drop_postponed_windows(&self, _app_id: AppId) {}

    /// A window was not recreated and its display capabilities are stale.
    fn reset_display_capabilities(&self, _app_id: AppId, _window_id: WindowId) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ResumptionObserver for NoopObserver {}
