//! Error types for correlation bookkeeping.

use resumption_types::{AppId, CorrelationKey};
use thiserror::Error;

/// Errors raised by the correlation registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The key already maps to a consumer.
    #[error("Correlation {key} already registered to {owner}")]
    AlreadyRegistered { key: CorrelationKey, owner: AppId },

    /// The key is already reserved by a pending-resumption handler.
    #[error("Correlation {0} already reserved")]
    AlreadyReserved(CorrelationKey),

    /// The message carries no correlation id and cannot be awaited.
    #[error("Message for {0} has no correlation id")]
    Untracked(AppId),

    /// Every correlation id in the configured range is live.
    #[error("No free correlation id")]
    Exhausted,
}
