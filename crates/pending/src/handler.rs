//! The pending-resumption handler abstraction.

use resumption_core::Action;
use resumption_ledger::{ConsumerResumptionStatus, RequestLedger};
use resumption_messages::{Directive, HmiMessage, HmiResponse, RequestParams};
use resumption_types::{AppId, CorrelationKey, ResourceKey, SavedSubscriptions};
use std::collections::BTreeSet;
use tracing::warn;

/// A resource-owning collaborator that restores its own subscriptions.
///
/// The coordinator knows nothing about resource semantics: it hands each
/// handler the saved subscriptions, routes responses to keys the handler
/// [`owns`](Self::owns), and on rollback passes what succeeded.
pub trait PendingResumptionHandler: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Register `app_id`'s saved subscriptions of this handler's kind.
    ///
    /// Each subscription is recorded as pending for the consumer (under its
    /// own correlation id) whether or not a request is actually sent.
    fn process_resumption(
        &mut self,
        app_id: AppId,
        saved: &SavedSubscriptions,
        ctx: &mut ResumptionContext<'_>,
    );

    /// Whether the handler awaits the response for `key`.
    fn owns(&self, key: &CorrelationKey) -> bool;

    /// Handle the response for an owned key.
    fn on_response(&mut self, response: &HmiResponse, ctx: &mut ResumptionContext<'_>);

    /// Undo the subscriptions in `keys` for a failed resumption.
    fn revert_resumption(&mut self, app_id: AppId, keys: &RevertSet, ctx: &mut ResumptionContext<'_>);

    /// Forget `app_id` after it disconnected.
    fn remove_consumer(&mut self, app_id: AppId, ctx: &mut ResumptionContext<'_>);

    /// Drop every outstanding and frozen request.
    fn clear_pending_resumption_requests(&mut self, ctx: &mut ResumptionContext<'_>);
}

/// Subscriptions that were restored and must be reverted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevertSet {
    pub vehicle_data: BTreeSet<String>,
    pub modules: BTreeSet<ResourceKey>,
    pub way_points: bool,
    pub app_services: BTreeSet<String>,
}

impl RevertSet {
    /// Collect the subscriptions `status` records as restored.
    pub fn from_status(status: &ConsumerResumptionStatus) -> Self {
        let mut keys = RevertSet {
            vehicle_data: status.successful_vehicle_data.clone(),
            ..Default::default()
        };
        for request in &status.succeeded {
            match request.message.params() {
                RequestParams::GetInteriorVehicleData {
                    module,
                    subscribe: true,
                } => {
                    keys.modules.insert(module.clone());
                }
                RequestParams::SubscribeWayPoints => keys.way_points = true,
                RequestParams::GetAppServiceData {
                    service_type,
                    subscribe: true,
                } => {
                    keys.app_services.insert(service_type.clone());
                }
                _ => {}
            }
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.vehicle_data.is_empty()
            && self.modules.is_empty()
            && !self.way_points
            && self.app_services.is_empty()
    }
}

/// A handler's view of the ledger for the duration of one call.
///
/// Collects the actions to perform and the synthesized responses to feed
/// back into the ledger once the handler returns.
pub struct ResumptionContext<'a> {
    ledger: &'a mut RequestLedger,
    actions: Vec<Action>,
    raised: Vec<HmiResponse>,
}

impl<'a> ResumptionContext<'a> {
    pub fn new(ledger: &'a mut RequestLedger) -> Self {
        Self {
            ledger,
            actions: Vec::new(),
            raised: Vec::new(),
        }
    }

    pub fn ledger(&self) -> &RequestLedger {
        &*self.ledger
    }

    /// Address `directive` with a fresh id and record it as pending for
    /// `app_id`, without sending it.
    ///
    /// Returns `None` (and records the directive as unsent) when no id is
    /// free.
    pub fn register_pending(&mut self, app_id: AppId, directive: Directive) -> Option<HmiMessage> {
        let Some(correlation_id) = self.ledger.registry_mut().new_correlation_id() else {
            warn!(app_id = %app_id, "No free correlation id for pending subscription");
            self.ledger.record_unsent(app_id, directive);
            return None;
        };
        let message = directive.into_message(app_id, Some(correlation_id));
        match self.ledger.register_pending(message.clone()) {
            Ok(_) => Some(message),
            Err(e) => {
                warn!(app_id = %app_id, error = %e, "Failed to register pending subscription");
                self.ledger.record_unsent(app_id, message.directive);
                None
            }
        }
    }

    /// Send `message` and await its response in this handler.
    pub fn send_awaited(&mut self, message: HmiMessage) -> Option<CorrelationKey> {
        let key = message.correlation_key()?;
        if let Err(e) = self.ledger.registry_mut().reserve(key) {
            warn!(key = %key, error = %e, "Failed to reserve correlation");
            return None;
        }
        let duration = self.ledger.response_timeout();
        self.actions.push(Action::SendToHmi { message });
        self.actions.push(Action::SetTimer { key, duration });
        Some(key)
    }

    /// Address `directive` with a fresh id, send it, and await it in this
    /// handler only.
    pub fn send_request(&mut self, app_id: AppId, directive: Directive) -> Option<CorrelationKey> {
        let correlation_id = self.ledger.registry_mut().new_correlation_id()?;
        self.send_awaited(directive.into_message(app_id, Some(correlation_id)))
    }

    /// Send `directive` without awaiting a response.
    pub fn send_untracked(&mut self, app_id: AppId, directive: Directive) {
        let message = self.ledger.untracked(app_id, directive);
        self.actions.push(Action::SendToHmi { message });
    }

    /// Arm a fresh response timer for `key`.
    ///
    /// Used when the consumer that sent `key` went away: cancelling its
    /// requests also cancelled this timer, but the handler still awaits the
    /// response.
    pub fn rearm(&mut self, key: CorrelationKey) {
        let duration = self.ledger.response_timeout();
        self.actions.push(Action::SetTimer { key, duration });
    }

    /// Stop awaiting `key` after its response arrived.
    pub fn release(&mut self, key: CorrelationKey) {
        self.ledger.registry_mut().release(&key);
    }

    /// Stop awaiting `key` before its response arrived.
    pub fn abandon(&mut self, key: CorrelationKey) {
        if self.ledger.registry_mut().release(&key) {
            self.actions.push(Action::CancelTimer { key });
        }
    }

    /// Deliver a synthesized response to whichever consumer awaits it.
    pub fn raise(&mut self, response: HmiResponse) {
        self.raised.push(response);
    }

    /// Actions to perform and responses to resolve, in order.
    pub fn into_parts(self) -> (Vec<Action>, Vec<HmiResponse>) {
        (self.actions, self.raised)
    }
}
