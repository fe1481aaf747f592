//! Core types for the resumption state machine.
//!
//! [`Event`]s go in, [`Action`]s come out. The runner owns all I/O and keeps
//! completion callbacks keyed by [`RestoreId`].

mod action;
mod event;
mod request;
mod traits;

pub use action::Action;
pub use event::Event;
pub use request::RestoreId;
pub use traits::StateMachine;
