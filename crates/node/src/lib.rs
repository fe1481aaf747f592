//! Composed resumption state machine.
//!
//! [`ResumptionStateMachine`] restores saved application state on the HMI.
//! It dispatches restore directives through the request ledger, hands
//! subscriptions to the pending-resumption handlers, routes every response
//! back, and finalizes each application once nothing is outstanding. A
//! failed resumption is rolled back.

mod config;
mod coordinator;
mod restored;
pub mod rollback;
mod router;
mod state;

pub use config::ResumptionConfig;
pub use restored::RestoredRecord;
pub use state::{default_handlers, ResumptionStateMachine};
