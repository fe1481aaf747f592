//! Test helpers for HMI resumption.
//!
//! [`fixtures`] builds saved application state. [`hmi`] inspects the
//! actions a state machine returns and scripts the HMI's answers.

pub mod fixtures;
pub mod hmi;
