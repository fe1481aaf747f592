//! Correlation bookkeeping for HMI resumption.
//!
//! - [`CorrelationRegistry`] issues correlation ids and maps each outstanding
//!   key to the consumer awaiting it.
//! - [`RequestLedger`] keeps each consumer's outstanding, succeeded and
//!   failed requests until its resumption is finalized.

mod error;
mod ledger;
mod registry;
mod status;

pub use error::RegistryError;
pub use ledger::{RequestLedger, Resolution};
pub use registry::CorrelationRegistry;
pub use status::{ConsumerResumptionStatus, PendingRequest};
