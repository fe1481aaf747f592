//! Request ledger: what each consumer is waiting for and how it went.

use crate::{ConsumerResumptionStatus, CorrelationRegistry, PendingRequest, RegistryError};
use resumption_core::Action;
use resumption_messages::{Directive, HmiMessage, HmiResponse, MessageKind, RequestParams};
use resumption_types::{AppId, CorrelationKey, FunctionId};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Outcome of resolving one pending request.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub app_id: AppId,
    pub request: PendingRequest,
    pub succeeded: bool,
    /// Whether the consumer has nothing left outstanding.
    pub consumer_complete: bool,
}

/// Per-consumer record of requests awaiting a response.
///
/// Owns the [`CorrelationRegistry`]: every tracked request is registered
/// there under its consumer, so a response resolves to exactly one
/// [`PendingRequest`].
#[derive(Debug)]
pub struct RequestLedger {
    registry: CorrelationRegistry,
    statuses: HashMap<AppId, ConsumerResumptionStatus>,
    response_timeout: Duration,
}

impl RequestLedger {
    pub fn new(registry: CorrelationRegistry, response_timeout: Duration) -> Self {
        Self {
            registry,
            statuses: HashMap::new(),
            response_timeout,
        }
    }

    pub fn registry(&self) -> &CorrelationRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CorrelationRegistry {
        &mut self.registry
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Address `directive`, record it as pending for `app_id` and send it.
    ///
    /// Notifications are sent untracked. A request for which no correlation
    /// id is free is recorded as unsent, which fails the resumption.
    pub fn dispatch(&mut self, app_id: AppId, directive: Directive) -> Vec<Action> {
        if directive.kind() == MessageKind::Notification {
            trace!(app_id = %app_id, function = directive.function.name(), "Sending notification");
            return vec![Action::SendToHmi {
                message: directive.into_message(app_id, None),
            }];
        }

        let Some(correlation_id) = self.registry.new_correlation_id() else {
            warn!(
                app_id = %app_id,
                function = directive.function.name(),
                "No free correlation id, directive not sent"
            );
            self.record_unsent(app_id, directive);
            return vec![];
        };

        let message = directive.into_message(app_id, Some(correlation_id));
        match self.register_pending(message.clone()) {
            Ok(key) => {
                debug!(app_id = %app_id, key = %key, "Dispatching directive");
                vec![
                    Action::SendToHmi { message },
                    Action::SetTimer {
                        key,
                        duration: self.response_timeout,
                    },
                ]
            }
            Err(e) => {
                warn!(app_id = %app_id, error = %e, "Failed to register directive");
                self.record_unsent(app_id, message.directive);
                vec![]
            }
        }
    }

    /// Record `message` as awaited by its consumer without sending it.
    ///
    /// Pending-resumption handlers use this for requests they send later,
    /// or never (a frozen waiter answered by a replay).
    pub fn register_pending(&mut self, message: HmiMessage) -> Result<CorrelationKey, RegistryError> {
        let key = message
            .correlation_key()
            .ok_or(RegistryError::Untracked(message.app_id))?;
        self.registry.register(key, message.app_id)?;
        let app_id = message.app_id;
        self.statuses
            .entry(app_id)
            .or_default()
            .outstanding
            .insert(key, PendingRequest { key, app_id, message });
        Ok(key)
    }

    /// Record a directive that could not be sent at all.
    pub fn record_unsent(&mut self, app_id: AppId, directive: Directive) {
        self.statuses
            .entry(app_id)
            .or_default()
            .unsent
            .push(directive);
    }

    /// Address `directive` with a fresh id without tracking it.
    ///
    /// Used for inverse directives during rollback: their responses are
    /// not awaited.
    pub fn untracked(&mut self, app_id: AppId, directive: Directive) -> HmiMessage {
        let correlation_id = match directive.kind() {
            MessageKind::Request => self.registry.new_correlation_id(),
            MessageKind::Notification => None,
        };
        directive.into_message(app_id, correlation_id)
    }

    /// Resolve the pending request `response` answers.
    ///
    /// Returns `None` for an unknown correlation (already resolved,
    /// cancelled, or never sent), which callers log and discard.
    pub fn resolve(&mut self, response: &HmiResponse) -> Option<Resolution> {
        let key = response.key();
        let app_id = self.registry.unregister(&key)?;
        let Some(status) = self.statuses.get_mut(&app_id) else {
            debug!(app_id = %app_id, key = %key, "Response for consumer without status");
            return None;
        };
        let Some(request) = status.outstanding.shift_remove(&key) else {
            warn!(app_id = %app_id, key = %key, "Registered key missing from outstanding set");
            return None;
        };

        let succeeded = response.is_successful();
        if request.message.function() == FunctionId::VehicleInfoSubscribeVehicleData {
            check_vehicle_data_response(&request, response, status);
        }

        if succeeded {
            status.succeeded.push(request.clone());
        } else {
            debug!(
                app_id = %app_id,
                key = %key,
                result_code = %response.result_code,
                "Directive failed"
            );
            status.failed.push(request.clone());
        }

        Some(Resolution {
            app_id,
            request,
            succeeded,
            consumer_complete: status.is_complete(),
        })
    }

    pub fn status(&self, app_id: AppId) -> Option<&ConsumerResumptionStatus> {
        self.statuses.get(&app_id)
    }

    /// Whether `app_id` still awaits at least one response.
    pub fn is_waiting(&self, app_id: AppId) -> bool {
        self.statuses
            .get(&app_id)
            .is_some_and(|status| !status.is_complete())
    }

    /// Remove and return the status of `app_id`.
    pub fn take_status(&mut self, app_id: AppId) -> Option<ConsumerResumptionStatus> {
        self.statuses.remove(&app_id)
    }

    /// Drop everything `app_id` is waiting for.
    ///
    /// Outstanding keys are unregistered first so a late response is treated
    /// as an unknown correlation.
    pub fn cancel_consumer(&mut self, app_id: AppId) -> Vec<Action> {
        let Some(status) = self.statuses.remove(&app_id) else {
            return vec![];
        };
        let mut actions = Vec::with_capacity(status.outstanding.len());
        for key in status.outstanding.keys() {
            self.registry.unregister(key);
            actions.push(Action::CancelTimer { key: *key });
        }
        debug!(
            app_id = %app_id,
            cancelled = actions.len(),
            "Cancelled outstanding requests"
        );
        actions
    }

    /// Drop every consumer's outstanding requests.
    pub fn cancel_all(&mut self) -> Vec<Action> {
        let app_ids: Vec<AppId> = self.statuses.keys().copied().collect();
        app_ids
            .into_iter()
            .flat_map(|app_id| self.cancel_consumer(app_id))
            .collect()
    }

    /// Number of consumers with a status.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Per-item bookkeeping for a vehicle data subscription.
///
/// A failed response fails every requested item. Otherwise an item missing
/// from the response counts as restored and any explicit code other than
/// `SUCCESS` fails it.
fn check_vehicle_data_response(
    request: &PendingRequest,
    response: &HmiResponse,
    status: &mut ConsumerResumptionStatus,
) {
    let RequestParams::SubscribeVehicleData { keys } = request.message.params() else {
        return;
    };

    if !response.is_successful() {
        trace!(key = %request.key, "Vehicle data request not successful");
        status
            .unsuccessful_vehicle_data
            .extend(keys.iter().cloned());
        return;
    }

    for item in keys {
        match response.vehicle_data.get(item) {
            Some(code) if !code.is_success() => {
                trace!(item = %item, code = ?code, "Vehicle data item not restored");
                status.unsuccessful_vehicle_data.insert(item.clone());
            }
            _ => {
                status.successful_vehicle_data.insert(item.clone());
            }
        }
    }
}
