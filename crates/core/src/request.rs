//! Restore request tracking.

/// Opaque ticket for one restore call.
///
/// The runner maintains a map of `RestoreId` -> completion callback.
/// This keeps callback invocation out of the sync state machine.
///
/// # Example
///
/// ```ignore
/// // In the runner:
/// let restore_id = RestoreId(self.next_restore_id);
/// self.next_restore_id += 1;
/// self.callbacks.insert(restore_id, callback);
///
/// // Send event to state machine
/// self.dispatch(Event::RestoreRequested { restore_id, app_id, saved });
///
/// // Later, when state machine returns Action::ResumptionFinished:
/// if let Some(callback) = self.callbacks.remove(&restore_id) {
///     callback(result, info);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RestoreId(pub u64);

impl RestoreId {
    /// Create a new restore ID.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RestoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "restore-{}", self.0)
    }
}
