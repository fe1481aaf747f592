//! Routing HMI responses, timeouts and refused dispatches.

use crate::ResumptionStateMachine;
use resumption_core::Action;
use resumption_ledger::Resolution;
use resumption_messages::{HmiResponse, RequestParams};
use resumption_types::{CorrelationKey, ResultCode};
use tracing::{debug, trace, warn};

impl ResumptionStateMachine {
    /// Route a response from the HMI.
    ///
    /// The ledger resolves it for the consumer awaiting it, and a handler
    /// owning the key gets it too. A key neither knows is logged and
    /// discarded.
    pub fn on_hmi_response(&mut self, response: HmiResponse) -> Vec<Action> {
        let key = response.key();
        let owner = self.handlers.iter().position(|h| h.owns(&key));
        let resolution = self.ledger.resolve(&response);

        if owner.is_none() && resolution.is_none() {
            warn!(
                key = %key,
                result_code = %response.result_code,
                "Response for unknown correlation"
            );
            return vec![];
        }
        trace!(key = %key, result_code = %response.result_code, "Routing response");

        let mut actions = vec![Action::CancelTimer { key }];
        // Handlers update their holders before the consumer can be finalized
        // and rolled back.
        if let Some(index) = owner {
            self.with_handler(index, &mut actions, |handler, ctx| {
                handler.on_response(&response, ctx)
            });
        }
        if let Some(resolution) = resolution {
            self.settle(resolution, &response, &mut actions);
        }
        self.drain_raised(&mut actions);
        actions
    }

    /// No response arrived in time.
    pub fn on_response_timeout(&mut self, key: CorrelationKey) -> Vec<Action> {
        debug!(key = %key, "Response timed out");
        self.on_hmi_response(HmiResponse::negative(
            key,
            ResultCode::GenericError,
            "Timed out waiting for the HMI",
        ))
    }

    /// The transport refused a message.
    pub fn on_dispatch_failed(&mut self, key: CorrelationKey) -> Vec<Action> {
        debug!(key = %key, "Dispatch failed");
        self.on_hmi_response(HmiResponse::negative(
            key,
            ResultCode::GenericError,
            "Message could not be sent to the HMI",
        ))
    }

    /// Resolve every response synthesized by handlers, including ones
    /// raised while resolving earlier ones.
    pub(crate) fn drain_raised(&mut self, actions: &mut Vec<Action>) {
        while let Some(response) = self.raised.pop_front() {
            match self.ledger.resolve(&response) {
                Some(resolution) => self.settle(resolution, &response, actions),
                None => debug!(
                    key = %response.key(),
                    "Synthesized response for unknown correlation"
                ),
            }
        }
    }

    /// Apply side effects of one resolved request and finalize its consumer
    /// when nothing else is outstanding.
    fn settle(&mut self, resolution: Resolution, response: &HmiResponse, actions: &mut Vec<Action>) {
        let app_id = resolution.app_id;
        if let RequestParams::CreateWindow { window } = resolution.request.message.params() {
            if resolution.succeeded {
                if let Some(record) = self.restored.get_mut(&app_id) {
                    record.windows.push(window.clone());
                }
            } else {
                warn!(
                    app_id = %app_id,
                    window_id = %window.window_id,
                    result_code = %response.result_code,
                    "Window not restored"
                );
                actions.push(Action::ResetDisplayCapabilities {
                    app_id,
                    window_id: window.window_id,
                });
            }
        }
        if resolution.consumer_complete {
            self.finalize_if_complete(app_id, actions);
        }
    }
}
