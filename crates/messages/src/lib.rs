//! Messages exchanged with the HMI during resumption.
//!
//! Outbound traffic is a [`Directive`] built from saved state and addressed
//! into an [`HmiMessage`]; inbound traffic is an [`HmiResponse`].

pub mod builders;
mod directive;
mod response;

pub use directive::{Directive, HmiMessage, MessageKind, RequestParams};
pub use response::HmiResponse;
