//! The seam between resumption logic and the runner that drives it.

use crate::{Action, Event};
use std::time::Duration;

/// Resumption logic driven by a runner.
///
/// An implementation never talks to the HMI or sleeps. It answers each
/// [`Event`] with the [`Action`]s the runner must perform: messages to send,
/// response timers to arm or cancel, and completions to report. Feeding the
/// same events in the same order yields the same actions, which is what lets
/// the integration tests script a whole HMI session without a runtime.
pub trait StateMachine {
    /// Apply `event` and return what the runner must do, in order.
    ///
    /// A timeout or refused dispatch arrives as its own event; the runner
    /// never retries on the state machine's behalf.
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Runner clock, updated before every `handle` call.
    fn set_time(&mut self, now: Duration);

    fn now(&self) -> Duration;
}
