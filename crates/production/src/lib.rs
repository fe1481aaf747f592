//! Production runner for HMI resumption.
//!
//! Wraps the synchronous [`ResumptionStateMachine`](resumption_node::ResumptionStateMachine)
//! in a tokio actor that owns it, talks to the HMI through an
//! [`HmiTransport`], and turns actions into timers and callbacks.

mod config;
mod error;
mod runner;
pub mod telemetry;
mod transport;

pub use config::RunnerConfig;
pub use error::{ConfigError, RunnerError};
pub use runner::{CompletionCallback, ResumptionHandle, ResumptionRunner};
pub use transport::{HmiTransport, NoopObserver, ResumptionObserver};
