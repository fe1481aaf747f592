//! Restoring one application's saved state and finalizing the outcome.

use crate::rollback::inverse_directives;
use crate::{RestoredRecord, ResumptionStateMachine};
use resumption_core::{Action, RestoreId};
use resumption_ledger::ConsumerResumptionStatus;
use resumption_messages::{builders, Directive};
use resumption_pending::RevertSet;
use resumption_types::{AppId, ResumptionResult, SavedApplication, WindowType};
use tracing::{debug, info, trace, warn};

impl ResumptionStateMachine {
    /// Start restoring `saved` for `app_id`.
    ///
    /// Sub-steps run in a fixed order: files, submenus, commands, choice
    /// sets, global properties, buttons, handler subscriptions, windows.
    /// With nothing left outstanding afterwards the resumption finishes
    /// immediately.
    pub fn on_restore(
        &mut self,
        restore_id: RestoreId,
        app_id: AppId,
        saved: &SavedApplication,
    ) -> Vec<Action> {
        if let Some(current) = self.in_progress.get(&app_id) {
            warn!(
                app_id = %app_id,
                restore_id = %restore_id,
                current = %current,
                "Resumption already in progress"
            );
            return vec![Action::ResumptionFinished {
                restore_id,
                app_id,
                result: ResumptionResult::ResumeFailed,
                info: "Resumption already in progress".to_string(),
            }];
        }

        info!(
            app_id = %app_id,
            restore_id = %restore_id,
            data = saved.has_data_to_restore(),
            global_properties = saved.has_global_properties_to_restore(),
            subscriptions = saved.has_subscriptions_to_restore(),
            "Starting resumption"
        );

        let mut actions = Vec::new();
        let mut record = RestoredRecord::default();

        self.restore_files(saved, &mut record);
        self.restore_submenus(app_id, saved, &mut record, &mut actions);
        self.restore_commands(app_id, saved, &mut record, &mut actions);
        self.restore_choice_sets(app_id, saved, &mut record, &mut actions);
        self.restore_global_properties(app_id, saved, &mut record, &mut actions);
        self.restore_subscriptions(app_id, saved, &mut record, &mut actions);
        self.restore_windows(app_id, saved, &mut actions);

        self.restored.insert(app_id, record);
        self.in_progress.insert(app_id, restore_id);

        self.drain_raised(&mut actions);
        self.finalize_if_complete(app_id, &mut actions);
        actions
    }

    fn dispatch(&mut self, app_id: AppId, directive: Directive, actions: &mut Vec<Action>) {
        actions.extend(self.ledger.dispatch(app_id, directive));
    }

    fn restore_files(&mut self, saved: &SavedApplication, record: &mut RestoredRecord) {
        for file in saved.files.iter().flatten() {
            if file.persistent && file.is_download_complete {
                trace!(file = %file.file_name, "Restoring file");
                record.files.push(file.clone());
            }
        }
    }

    fn restore_submenus(
        &mut self,
        app_id: AppId,
        saved: &SavedApplication,
        record: &mut RestoredRecord,
        actions: &mut Vec<Action>,
    ) {
        for submenu in saved.submenus.iter().flatten() {
            self.dispatch(app_id, builders::add_submenu(submenu), actions);
            record.submenus.push(submenu.clone());
        }
    }

    fn restore_commands(
        &mut self,
        app_id: AppId,
        saved: &SavedApplication,
        record: &mut RestoredRecord,
        actions: &mut Vec<Action>,
    ) {
        for command in saved.commands.iter().flatten() {
            for directive in builders::add_command(command) {
                self.dispatch(app_id, directive, actions);
            }
            record.commands.push(command.clone());
        }
    }

    fn restore_choice_sets(
        &mut self,
        app_id: AppId,
        saved: &SavedApplication,
        record: &mut RestoredRecord,
        actions: &mut Vec<Action>,
    ) {
        for choice_set in saved.choice_sets.iter().flatten() {
            for directive in builders::add_choice_set(choice_set) {
                self.dispatch(app_id, directive, actions);
            }
            record.choice_sets.push(choice_set.clone());
        }
    }

    fn restore_global_properties(
        &mut self,
        app_id: AppId,
        saved: &SavedApplication,
        record: &mut RestoredRecord,
        actions: &mut Vec<Action>,
    ) {
        let Some(properties) = saved.global_properties.as_ref().filter(|p| !p.is_empty()) else {
            return;
        };
        let halves = [
            builders::set_ui_global_properties(properties),
            builders::set_tts_global_properties(properties),
        ];
        for directive in halves.into_iter().flatten() {
            self.dispatch(app_id, directive, actions);
        }
        record.global_properties = Some(properties.clone());
    }

    /// Buttons first, then every pending-resumption handler.
    fn restore_subscriptions(
        &mut self,
        app_id: AppId,
        saved: &SavedApplication,
        record: &mut RestoredRecord,
        actions: &mut Vec<Action>,
    ) {
        let Some(subscriptions) = saved.subscriptions.as_ref() else {
            return;
        };
        for button in subscriptions.hmi_buttons() {
            self.dispatch(app_id, builders::button_subscription(button, true), actions);
            record.buttons.insert(button);
        }
        self.with_each_handler(actions, |handler, ctx| {
            handler.process_resumption(app_id, subscriptions, ctx)
        });
    }

    /// Widget windows only. The main window always exists.
    fn restore_windows(&mut self, app_id: AppId, saved: &SavedApplication, actions: &mut Vec<Action>) {
        for window in saved.windows.iter().flatten() {
            if window.window_type == WindowType::Main {
                continue;
            }
            self.dispatch(app_id, builders::create_window(window), actions);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Finalization
    // ═══════════════════════════════════════════════════════════════════════════

    /// Finalize `app_id` once it awaits nothing any more.
    pub(crate) fn finalize_if_complete(&mut self, app_id: AppId, actions: &mut Vec<Action>) {
        if self.ledger.is_waiting(app_id) {
            return;
        }
        if !self.in_progress.contains_key(&app_id) {
            // Leftover from an abandoned resumption.
            self.ledger.take_status(app_id);
            return;
        }
        self.finalize(app_id, actions);
    }

    fn finalize(&mut self, app_id: AppId, actions: &mut Vec<Action>) {
        let Some(restore_id) = self.in_progress.remove(&app_id) else {
            return;
        };
        let status = self.ledger.take_status(app_id).unwrap_or_default();
        let info = status.summary();

        if status.is_successful() {
            info!(
                app_id = %app_id,
                restore_id = %restore_id,
                succeeded = status.succeeded.len(),
                "Resumption succeeded"
            );
            actions.push(Action::ResumptionFinished {
                restore_id,
                app_id,
                result: ResumptionResult::Success,
                info,
            });
            actions.push(Action::ResumePostponedWindows { app_id });
        } else {
            warn!(
                app_id = %app_id,
                restore_id = %restore_id,
                failed = status.failed.len(),
                unsent = status.unsent.len(),
                info = %info,
                "Resumption failed"
            );
            actions.push(Action::ResumptionFinished {
                restore_id,
                app_id,
                result: ResumptionResult::ResumeFailed,
                info,
            });
            actions.push(Action::DropPostponedWindows { app_id });
            self.revert(app_id, &status, actions);
        }
    }

    /// Undo what `status` records as succeeded and drop the restored record.
    fn revert(&mut self, app_id: AppId, status: &ConsumerResumptionStatus, actions: &mut Vec<Action>) {
        let record = self.restored.remove(&app_id).unwrap_or_default();
        let directives = inverse_directives(status, &record);
        debug!(app_id = %app_id, inverses = directives.len(), "Rolling back");
        for directive in directives {
            let message = self.ledger.untracked(app_id, directive);
            actions.push(Action::SendToHmi { message });
        }

        let keys = RevertSet::from_status(status);
        self.with_each_handler(actions, |handler, ctx| {
            handler.revert_resumption(app_id, &keys, ctx)
        });
    }

    /// Roll back everything restored so far for `app_id`.
    ///
    /// A resumption still in progress fails and its pending subscriptions
    /// are withdrawn from every handler. Once a resumption is finalized its
    /// status is gone, so calling this again does nothing.
    pub fn rollback(&mut self, app_id: AppId) -> Vec<Action> {
        let mut actions = Vec::new();
        let Some(status) = self.ledger.take_status(app_id) else {
            trace!(app_id = %app_id, "Nothing to roll back");
            return actions;
        };

        for key in status.outstanding.keys() {
            self.ledger.registry_mut().unregister(key);
            actions.push(Action::CancelTimer { key: *key });
        }
        if let Some(restore_id) = self.in_progress.remove(&app_id) {
            actions.push(Action::ResumptionFinished {
                restore_id,
                app_id,
                result: ResumptionResult::ResumeFailed,
                info: "Resumption rolled back".to_string(),
            });
            actions.push(Action::DropPostponedWindows { app_id });
        }
        // Frozen and queued subscriptions must not be sent on its behalf
        // later, and an orphaned request must not make it a holder.
        self.with_each_handler(&mut actions, |handler, ctx| {
            handler.remove_consumer(app_id, ctx)
        });
        self.revert(app_id, &status, &mut actions);
        self.drain_raised(&mut actions);
        actions
    }
}
