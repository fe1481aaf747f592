//! Core types for HMI state resumption.
//!
//! Identifiers, HMI function ids, result codes, shared resource keys and the
//! saved-session snapshot that every other crate in the workspace builds on.

mod function;
mod identifiers;
mod resource;
mod result;
mod saved;
mod ui;

pub use function::{CorrelationKey, FunctionId};
pub use identifiers::{AppId, ChoiceSetId, CommandId, CorrelationId, MenuId, WindowId};
pub use resource::ResourceKey;
pub use result::{ResultCode, ResumptionResult, VehicleDataResultCode};
pub use saved::{
    GlobalProperties, KeyboardProperties, MenuParams, SavedApplication, SavedChoice,
    SavedChoiceSet, SavedCommand, SavedFile, SavedSubMenu, SavedSubscriptions, SavedWindow,
};
pub use ui::{ButtonName, VrCommandType, WindowType};
