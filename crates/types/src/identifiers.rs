//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application (consumer) identifier.
///
/// This is the id under which a reconnecting client application is known to
/// the middleware. All resumption bookkeeping is keyed by it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AppId(pub u32);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "App({})", self.0)
    }
}

/// Correlation identifier pairing an HMI request with its response.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CorrelationId(pub u32);

impl CorrelationId {
    /// Get the raw value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cid-{}", self.0)
    }
}

/// Submenu identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MenuId(pub u32);

impl fmt::Display for MenuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Menu({})", self.0)
    }
}

/// Command identifier.
///
/// Choices inside a choice set share this id space on the VR side, which is
/// why VR directives carry a [`crate::VrCommandType`] discriminator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CommandId(pub u32);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cmd({})", self.0)
    }
}

/// Interaction choice set identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChoiceSetId(pub u32);

impl fmt::Display for ChoiceSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChoiceSet({})", self.0)
    }
}

/// Window identifier. `0` is the main window, which is never re-created.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WindowId(pub i32);

impl WindowId {
    /// The application's main window.
    pub const MAIN: Self = WindowId(0);

    /// Whether this is the main window.
    pub fn is_main(self) -> bool {
        self == Self::MAIN
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Window({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display() {
        assert_eq!(AppId(7).to_string(), "App(7)");
        assert_eq!(CorrelationId(42).to_string(), "cid-42");
        assert_eq!(WindowId(3).to_string(), "Window(3)");
    }

    #[test]
    fn test_main_window() {
        assert!(WindowId::MAIN.is_main());
        assert!(!WindowId(2).is_main());
    }

    #[test]
    fn test_transparent_serde() {
        let id: AppId = serde_json::from_str("17").unwrap();
        assert_eq!(id, AppId(17));
        assert_eq!(serde_json::to_string(&CorrelationId(5)).unwrap(), "5");
    }
}
