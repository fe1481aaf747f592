//! Read-only snapshot of an application's persisted session.
//!
//! Every section is optional and tested independently: an absent section
//! means "nothing to restore for that category", never an error. The storage
//! format itself is owned elsewhere; this is the structured view resumption
//! consumes.

use crate::{ButtonName, ChoiceSetId, CommandId, MenuId, ResourceKey, WindowId, WindowType};
use serde::{Deserialize, Serialize};

/// Saved application state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedApplication {
    pub files: Option<Vec<SavedFile>>,
    pub submenus: Option<Vec<SavedSubMenu>>,
    pub commands: Option<Vec<SavedCommand>>,
    pub choice_sets: Option<Vec<SavedChoiceSet>>,
    pub global_properties: Option<GlobalProperties>,
    pub subscriptions: Option<SavedSubscriptions>,
    pub windows: Option<Vec<SavedWindow>>,
}

impl SavedApplication {
    /// Whether any UI artifact (submenu, command, choice set, window) is saved.
    pub fn has_data_to_restore(&self) -> bool {
        non_empty(&self.submenus)
            || non_empty(&self.commands)
            || non_empty(&self.choice_sets)
            || non_empty(&self.windows)
    }

    /// Whether any global property is saved.
    pub fn has_global_properties_to_restore(&self) -> bool {
        self.global_properties
            .as_ref()
            .is_some_and(|props| !props.is_empty())
    }

    /// Whether any subscription the HMI needs to know about is saved.
    pub fn has_subscriptions_to_restore(&self) -> bool {
        self.subscriptions
            .as_ref()
            .is_some_and(SavedSubscriptions::has_any)
    }

    /// Whether there is nothing at all to restore on the HMI.
    pub fn is_empty(&self) -> bool {
        !self.has_data_to_restore()
            && !self.has_global_properties_to_restore()
            && !self.has_subscriptions_to_restore()
    }
}

fn non_empty<T>(section: &Option<Vec<T>>) -> bool {
    section.as_ref().is_some_and(|items| !items.is_empty())
}

/// A file previously uploaded by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    pub file_name: String,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub is_download_complete: bool,
}

/// A submenu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSubMenu {
    pub menu_id: MenuId,
    pub menu_name: String,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub parent_id: Option<MenuId>,
}

/// UI placement of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuParams {
    pub menu_name: String,
    #[serde(default)]
    pub parent_id: Option<MenuId>,
    #[serde(default)]
    pub position: Option<u32>,
}

/// A command with an optional UI half and an optional VR half.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCommand {
    pub cmd_id: CommandId,
    #[serde(default)]
    pub menu_params: Option<MenuParams>,
    #[serde(default)]
    pub vr_commands: Option<Vec<String>>,
}

/// A choice inside a choice set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedChoice {
    pub choice_id: CommandId,
    pub menu_name: String,
    #[serde(default)]
    pub vr_commands: Option<Vec<String>>,
}

/// An interaction choice set. Restored on the VR side only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedChoiceSet {
    pub choice_set_id: ChoiceSetId,
    pub grammar_id: u32,
    #[serde(default)]
    pub choices: Vec<SavedChoice>,
}

/// Keyboard configuration kept as part of the global properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardProperties {
    pub language: Option<String>,
    pub layout: Option<String>,
}

/// Global properties split into their UI and TTS halves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalProperties {
    pub help_prompt: Vec<String>,
    pub timeout_prompt: Vec<String>,
    pub vr_help_title: Option<String>,
    pub vr_help: Vec<String>,
    pub menu_title: Option<String>,
    pub menu_icon: Option<String>,
    pub keyboard_properties: Option<KeyboardProperties>,
}

impl GlobalProperties {
    /// Whether the UI half has anything to set.
    pub fn has_ui_properties(&self) -> bool {
        self.vr_help_title.is_some()
            || !self.vr_help.is_empty()
            || self.menu_title.is_some()
            || self.menu_icon.is_some()
            || self.keyboard_properties.is_some()
    }

    /// Whether the TTS half has anything to set.
    pub fn has_tts_properties(&self) -> bool {
        !self.help_prompt.is_empty() || !self.timeout_prompt.is_empty()
    }

    /// Whether no property is set at all.
    pub fn is_empty(&self) -> bool {
        !self.has_ui_properties() && !self.has_tts_properties()
    }
}

/// Subscriptions held by the application when it disconnected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedSubscriptions {
    pub buttons: Vec<ButtonName>,
    pub vehicle_data: Vec<String>,
    pub modules: Vec<ResourceKey>,
    pub way_points: bool,
    pub app_services: Vec<String>,
}

impl SavedSubscriptions {
    /// Button subscriptions that are mirrored to the HMI.
    pub fn hmi_buttons(&self) -> impl Iterator<Item = ButtonName> + '_ {
        self.buttons.iter().copied().filter(|b| b.is_hmi_visible())
    }

    /// Whether any subscription needs an HMI directive.
    pub fn has_any(&self) -> bool {
        self.hmi_buttons().next().is_some()
            || !self.vehicle_data.is_empty()
            || !self.modules.is_empty()
            || self.way_points
            || !self.app_services.is_empty()
    }
}

/// A widget window created by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedWindow {
    pub window_id: WindowId,
    pub window_name: String,
    pub window_type: WindowType,
    #[serde(default)]
    pub associated_service_type: Option<String>,
    #[serde(default)]
    pub duplicate_updates_from_window_id: Option<WindowId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_nothing_to_restore() {
        let saved = SavedApplication::default();
        assert!(saved.is_empty());
    }

    #[test]
    fn test_empty_sections_count_as_absent() {
        let saved = SavedApplication {
            submenus: Some(vec![]),
            global_properties: Some(GlobalProperties::default()),
            subscriptions: Some(SavedSubscriptions::default()),
            ..Default::default()
        };
        assert!(saved.is_empty());
    }

    #[test]
    fn test_custom_button_alone_is_not_a_subscription() {
        let subscriptions = SavedSubscriptions {
            buttons: vec![ButtonName::CustomButton],
            ..Default::default()
        };
        assert!(!subscriptions.has_any());

        let subscriptions = SavedSubscriptions {
            buttons: vec![ButtonName::CustomButton, ButtonName::Ok],
            ..Default::default()
        };
        assert!(subscriptions.has_any());
        assert_eq!(
            subscriptions.hmi_buttons().collect::<Vec<_>>(),
            vec![ButtonName::Ok]
        );
    }

    #[test]
    fn test_global_properties_halves() {
        let props = GlobalProperties {
            help_prompt: vec!["help".into()],
            ..Default::default()
        };
        assert!(props.has_tts_properties());
        assert!(!props.has_ui_properties());

        let props = GlobalProperties {
            menu_title: Some("Menu".into()),
            ..Default::default()
        };
        assert!(props.has_ui_properties());
        assert!(!props.has_tts_properties());
    }

    #[test]
    fn test_deserialize_partial_snapshot() {
        let json = r#"{
            "submenus": [{ "menu_id": 10, "menu_name": "Settings" }],
            "subscriptions": { "vehicle_data": ["gps", "speed"], "way_points": true }
        }"#;
        let saved: SavedApplication = serde_json::from_str(json).unwrap();
        assert!(saved.has_data_to_restore());
        assert!(saved.has_subscriptions_to_restore());
        assert!(saved.commands.is_none());
        let subscriptions = saved.subscriptions.unwrap();
        assert_eq!(subscriptions.vehicle_data, vec!["gps", "speed"]);
        assert!(subscriptions.way_points);
    }
}
