//! Small enumerations shared by saved state and HMI directives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware or soft button an application may subscribe to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonName {
    Ok,
    PlayPause,
    SeekLeft,
    SeekRight,
    TuneUp,
    TuneDown,
    Preset0,
    Preset1,
    Preset2,
    Preset3,
    Search,
    /// Soft buttons. Every application is implicitly subscribed, so it is
    /// never restored or reverted through the HMI.
    CustomButton,
}

impl ButtonName {
    /// Whether this button subscription is mirrored to the HMI.
    pub fn is_hmi_visible(self) -> bool {
        self != ButtonName::CustomButton
    }
}

impl fmt::Display for ButtonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Discriminates VR commands belonging to menu commands from those
/// belonging to choice set choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VrCommandType {
    Command,
    Choice,
}

/// Window type. Only widgets are created during resumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindowType {
    Main,
    Widget,
}
