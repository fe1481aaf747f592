//! What resumption put back on the HMI for one application.

use resumption_types::{
    ButtonName, GlobalProperties, SavedChoiceSet, SavedCommand, SavedFile, SavedSubMenu,
    SavedWindow,
};
use std::collections::BTreeSet;

/// In-memory record of provisionally restored state.
///
/// Filled while directives are dispatched. Kept when resumption succeeds and
/// dropped on rollback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredRecord {
    /// Persistent, fully downloaded files. Restored without an HMI request.
    pub files: Vec<SavedFile>,
    pub submenus: Vec<SavedSubMenu>,
    pub commands: Vec<SavedCommand>,
    pub choice_sets: Vec<SavedChoiceSet>,
    pub global_properties: Option<GlobalProperties>,
    /// Button subscriptions announced to the HMI.
    pub buttons: BTreeSet<ButtonName>,
    /// Windows the HMI confirmed.
    pub windows: Vec<SavedWindow>,
}

impl RestoredRecord {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.submenus.is_empty()
            && self.commands.is_empty()
            && self.choice_sets.is_empty()
            && self.global_properties.is_none()
            && self.buttons.is_empty()
            && self.windows.is_empty()
    }
}
