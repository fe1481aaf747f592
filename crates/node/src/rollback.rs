//! Inverse directives for a failed resumption.
//!
//! Only what the HMI confirmed is undone. A command whose VR half failed
//! still gets its UI half deleted, and each global properties half is reset
//! on its own.

use crate::RestoredRecord;
use resumption_ledger::ConsumerResumptionStatus;
use resumption_messages::{builders, Directive, RequestParams};

/// Directives undoing every succeeded directive in `status`, newest first,
/// followed by button unsubscriptions for `record`.
///
/// Subscriptions owned by pending-resumption handlers are not covered here.
pub fn inverse_directives(
    status: &ConsumerResumptionStatus,
    record: &RestoredRecord,
) -> Vec<Directive> {
    let mut directives: Vec<Directive> = status
        .succeeded
        .iter()
        .rev()
        .filter_map(|request| match request.message.params() {
            RequestParams::AddSubMenu { menu_id, .. } => Some(builders::delete_submenu(*menu_id)),
            RequestParams::AddUiCommand { cmd_id, .. } => {
                Some(builders::delete_ui_command(*cmd_id))
            }
            RequestParams::AddVrCommand {
                cmd_id,
                command_type,
                grammar_id,
                ..
            } => Some(builders::delete_vr_command(*cmd_id, *command_type, *grammar_id)),
            RequestParams::SetGlobalProperties { .. } => {
                Some(builders::reset_global_properties(request.message.function()))
            }
            RequestParams::CreateWindow { window } => {
                Some(builders::delete_window(window.window_id))
            }
            _ => None,
        })
        .collect();

    directives.extend(
        record
            .buttons
            .iter()
            .filter(|button| button.is_hmi_visible())
            .map(|button| builders::button_subscription(*button, false)),
    );
    directives
}
