//! Vehicle data subscriptions.
//!
//! Resuming applications are served one at a time, in arrival order. Only
//! the front of the queue has a request outstanding at the HMI. When it
//! resolves, every following application is credited with the items that
//! response restored, and the next one still missing items sends a request
//! for just those.
//!
//! Each application awaits a *synthesized* `SubscribeVehicleData` under its
//! own correlation id; the handler raises a response for it carrying the
//! per-item results once that application is done.

use crate::handler::{PendingResumptionHandler, ResumptionContext, RevertSet};
use crate::subscriptions::SubscriptionIndex;
use resumption_messages::{builders, HmiResponse};
use resumption_types::{
    AppId, CorrelationKey, ResultCode, SavedSubscriptions, VehicleDataResultCode,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, trace, warn};

/// One application's vehicle data resumption.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDataPendingResumption {
    pub app_id: AppId,
    /// Key of the synthesized request the application awaits.
    pub synthesized_key: CorrelationKey,
    pub requested: BTreeSet<String>,
    /// Always a subset of `requested`.
    pub restored: BTreeSet<String>,
    pub results: BTreeMap<String, VehicleDataResultCode>,
    /// Key of the request sent to the HMI on this application's behalf.
    pub waiting_for: Option<CorrelationKey>,
    /// The application went away while its request was outstanding.
    pub orphaned: bool,
}

impl VehicleDataPendingResumption {
    fn new(app_id: AppId, synthesized_key: CorrelationKey, requested: BTreeSet<String>) -> Self {
        Self {
            app_id,
            synthesized_key,
            requested,
            restored: BTreeSet::new(),
            results: BTreeMap::new(),
            waiting_for: None,
            orphaned: false,
        }
    }

    /// Whether every requested item was restored.
    pub fn is_successfully_done(&self) -> bool {
        self.requested.len() == self.restored.len()
    }

    /// Requested items not restored yet.
    pub fn not_subscribed_data(&self) -> BTreeSet<String> {
        self.requested.difference(&self.restored).cloned().collect()
    }

    /// Credit the requested items among `successful`.
    fn fill_restored_data<'a>(&mut self, successful: impl IntoIterator<Item = &'a String>) {
        for item in successful {
            if self.requested.contains(item) {
                self.restored.insert(item.clone());
            }
        }
    }

    /// Final per-item results after the response to this application's own
    /// request.
    fn fill_subscription_results(&mut self, response: &HmiResponse) {
        self.fill_restored_data(&successful_items(response));

        for item in &self.restored {
            self.results
                .insert(item.clone(), VehicleDataResultCode::Success);
        }
        for item in self.not_subscribed_data() {
            self.results
                .insert(item, VehicleDataResultCode::DataNotSubscribed);
        }
        // A failed response restores nothing, whatever its items report.
        if !response.is_successful() {
            return;
        }
        for (item, code) in &response.vehicle_data {
            if self.requested.contains(item) {
                self.results.insert(item.clone(), *code);
            }
        }
    }

    /// Results when everything was credited from earlier responses.
    fn fill_credited_results(&mut self) {
        for item in &self.restored {
            self.results
                .insert(item.clone(), VehicleDataResultCode::Success);
        }
    }
}

/// Items a response reports as restored.
///
/// A failed response restores nothing. A successful one restores exactly the
/// items it reports as `SUCCESS`.
fn successful_items(response: &HmiResponse) -> BTreeSet<String> {
    if !response.is_successful() {
        return BTreeSet::new();
    }
    response
        .vehicle_data
        .iter()
        .filter(|(_, code)| code.is_success())
        .map(|(item, _)| item.clone())
        .collect()
}

/// Restores vehicle data subscriptions.
#[derive(Debug, Default)]
pub struct VehicleDataResumptionHandler {
    pending: VecDeque<VehicleDataPendingResumption>,
    holders: SubscriptionIndex<String>,
}

impl VehicleDataResumptionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending resumptions, front first.
    pub fn pending(&self) -> impl Iterator<Item = &VehicleDataPendingResumption> {
        self.pending.iter()
    }

    pub fn holders(&self) -> &SubscriptionIndex<String> {
        &self.holders
    }

    /// Raise the synthesized response for a finished application.
    fn finish(&mut self, pending: VehicleDataPendingResumption, ctx: &mut ResumptionContext<'_>) {
        if !pending.orphaned {
            for item in &pending.restored {
                trace!(app_id = %pending.app_id, item = %item, "Vehicle data restored");
                self.holders.add(pending.app_id, item.clone());
            }
        }
        debug!(
            app_id = %pending.app_id,
            key = %pending.synthesized_key,
            restored = pending.restored.len(),
            requested = pending.requested.len(),
            "Finished vehicle data resumption"
        );
        ctx.raise(
            HmiResponse::success(pending.synthesized_key).with_vehicle_data(pending.results),
        );
    }

    /// Send the front's request for its missing items, unless it already
    /// waits. A front that cannot send finishes with what it has.
    fn trigger_pending_resumption(&mut self, ctx: &mut ResumptionContext<'_>) {
        while let Some(front) = self.pending.front_mut() {
            if front.waiting_for.is_some() {
                trace!(app_id = %front.app_id, "Front already waiting for the HMI");
                return;
            }
            let missing = front.not_subscribed_data();
            let app_id = front.app_id;
            match ctx.send_request(app_id, builders::subscribe_vehicle_data(&missing)) {
                Some(key) => {
                    debug!(app_id = %app_id, key = %key, items = missing.len(), "Requesting vehicle data");
                    front.waiting_for = Some(key);
                    return;
                }
                None => {
                    warn!(app_id = %app_id, "Failed to send vehicle data request");
                    if let Some(mut pending) = self.pending.pop_front() {
                        pending.fill_subscription_results(&HmiResponse::negative(
                            pending.synthesized_key,
                            ResultCode::GenericError,
                            "Vehicle data request could not be sent",
                        ));
                        self.finish(pending, ctx);
                    }
                }
            }
        }
    }

    /// Unsubscribe the items among `items` that nobody holds and no queued
    /// application has been credited with.
    fn unsubscribe_unused(
        &self,
        app_id: AppId,
        items: impl IntoIterator<Item = String>,
        ctx: &mut ResumptionContext<'_>,
    ) {
        let unused: Vec<String> = items
            .into_iter()
            .filter(|item| !self.holders.is_held(item))
            .filter(|item| {
                !self
                    .pending
                    .iter()
                    .any(|p| !p.orphaned && p.restored.contains(item))
            })
            .collect();
        if unused.is_empty() {
            return;
        }
        debug!(app_id = %app_id, items = unused.len(), "Unsubscribing unused vehicle data");
        ctx.send_untracked(app_id, builders::unsubscribe_vehicle_data(&unused));
    }

    /// Credit following applications with what `response` restored.
    fn process_next_pending_resumption(
        &mut self,
        response: &HmiResponse,
        ctx: &mut ResumptionContext<'_>,
    ) {
        let successful = successful_items(response);
        while let Some(front) = self.pending.front_mut() {
            if front.waiting_for.is_some() {
                return;
            }
            front.fill_restored_data(&successful);
            if !front.is_successfully_done() {
                self.trigger_pending_resumption(ctx);
                return;
            }
            if let Some(mut done) = self.pending.pop_front() {
                done.fill_credited_results();
                self.finish(done, ctx);
            }
        }
    }
}

impl PendingResumptionHandler for VehicleDataResumptionHandler {
    fn name(&self) -> &'static str {
        "vehicle_data"
    }

    fn process_resumption(
        &mut self,
        app_id: AppId,
        saved: &SavedSubscriptions,
        ctx: &mut ResumptionContext<'_>,
    ) {
        let requested: BTreeSet<String> = saved.vehicle_data.iter().cloned().collect();
        if requested.is_empty() {
            return;
        }
        if self.pending.iter().any(|p| p.app_id == app_id && !p.orphaned) {
            debug!(app_id = %app_id, "Vehicle data resumption already pending");
            return;
        }

        let Some(message) =
            ctx.register_pending(app_id, builders::subscribe_vehicle_data(&requested))
        else {
            return;
        };
        let Some(key) = message.correlation_key() else {
            return;
        };

        let mut pending = VehicleDataPendingResumption::new(app_id, key, requested);
        // Items another application already holds need no HMI request.
        let held: Vec<String> = pending
            .requested
            .iter()
            .filter(|item| self.holders.is_held(item))
            .cloned()
            .collect();
        pending.fill_restored_data(&held);

        if pending.is_successfully_done() {
            pending.fill_credited_results();
            self.finish(pending, ctx);
            return;
        }

        debug!(app_id = %app_id, key = %key, "Queued vehicle data resumption");
        self.pending.push_back(pending);
        if self.pending.len() == 1 {
            self.trigger_pending_resumption(ctx);
        }
    }

    fn owns(&self, key: &CorrelationKey) -> bool {
        self.pending
            .front()
            .is_some_and(|front| front.waiting_for.as_ref() == Some(key))
    }

    fn on_response(&mut self, response: &HmiResponse, ctx: &mut ResumptionContext<'_>) {
        let key = response.key();
        if !self.owns(&key) {
            debug!(key = %key, "Not waiting for this vehicle data response");
            return;
        }
        ctx.release(key);
        let Some(mut current) = self.pending.pop_front() else {
            return;
        };

        let mut response = response.clone();
        if response.is_successful() && response.vehicle_data.is_empty() {
            // An empty successful response restores everything requested.
            response.vehicle_data = current
                .not_subscribed_data()
                .into_iter()
                .map(|item| (item, VehicleDataResultCode::Success))
                .collect();
        }

        current.fill_subscription_results(&response);
        let orphaned = current
            .orphaned
            .then(|| (current.app_id, current.restored.clone()));
        self.finish(current, ctx);
        self.process_next_pending_resumption(&response, ctx);
        if let Some((app_id, restored)) = orphaned {
            self.unsubscribe_unused(app_id, restored, ctx);
        }
    }

    fn revert_resumption(&mut self, app_id: AppId, keys: &RevertSet, ctx: &mut ResumptionContext<'_>) {
        let released: Vec<String> = keys
            .vehicle_data
            .iter()
            .filter(|item| self.holders.remove(app_id, item))
            .cloned()
            .collect();
        if !released.is_empty() {
            debug!(app_id = %app_id, items = released.len(), "Unsubscribing vehicle data");
            ctx.send_untracked(app_id, builders::unsubscribe_vehicle_data(&released));
        }
        self.trigger_pending_resumption(ctx);
    }

    fn remove_consumer(&mut self, app_id: AppId, ctx: &mut ResumptionContext<'_>) {
        // The front keeps its outstanding request so the queue keeps moving.
        let mut kept = VecDeque::with_capacity(self.pending.len());
        for mut pending in self.pending.drain(..) {
            if pending.app_id != app_id {
                kept.push_back(pending);
            } else if pending.waiting_for.is_some() {
                pending.orphaned = true;
                kept.push_back(pending);
            }
        }
        self.pending = kept;
        let released = self.holders.remove_consumer(app_id);
        self.trigger_pending_resumption(ctx);
        self.unsubscribe_unused(app_id, released, ctx);
    }

    fn clear_pending_resumption_requests(&mut self, ctx: &mut ResumptionContext<'_>) {
        if let Some(key) = self.pending.front().and_then(|front| front.waiting_for) {
            ctx.abandon(key);
        }
        debug!(dropped = self.pending.len(), "Cleared vehicle data resumptions");
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resumption_core::Action;
    use resumption_ledger::{CorrelationRegistry, RequestLedger};
    use resumption_messages::{HmiMessage, RequestParams};
    use resumption_types::FunctionId;
    use std::time::Duration;
    use tracing_test::traced_test;

    fn make_ledger() -> RequestLedger {
        RequestLedger::new(CorrelationRegistry::default(), Duration::from_secs(10))
    }

    fn saved(items: &[&str]) -> SavedSubscriptions {
        SavedSubscriptions {
            vehicle_data: items.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn sent(actions: &[Action]) -> Vec<HmiMessage> {
        actions
            .iter()
            .filter_map(|a| a.as_hmi_message().cloned())
            .collect()
    }

    fn requested_items(message: &HmiMessage) -> Vec<String> {
        match message.params() {
            RequestParams::SubscribeVehicleData { keys } => keys.clone(),
            other => panic!("unexpected params {other:?}"),
        }
    }

    #[traced_test]
    #[test]
    fn test_front_is_the_only_outstanding_request() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps", "speed"]), &mut ctx);
        handler.process_resumption(AppId(2), &saved(&["gps"]), &mut ctx);
        let (actions, raised) = ctx.into_parts();

        let sent = sent(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].function(), FunctionId::VehicleInfoSubscribeVehicleData);
        assert_eq!(requested_items(&sent[0]), vec!["gps", "speed"]);
        assert!(raised.is_empty());
        assert!(handler.owns(&sent[0].correlation_key().unwrap()));

        // The synthesized requests are awaited by their applications.
        assert!(ledger.is_waiting(AppId(1)));
        assert!(ledger.is_waiting(AppId(2)));
    }

    #[traced_test]
    #[test]
    fn test_following_application_is_credited() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps", "speed"]), &mut ctx);
        handler.process_resumption(AppId(2), &saved(&["gps"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&HmiResponse::success(key), &mut ctx);
        let (actions, raised) = ctx.into_parts();

        assert!(sent(&actions).is_empty());
        assert_eq!(raised.len(), 2);
        assert_eq!(raised[0].vehicle_data.len(), 2);
        assert_eq!(
            raised[1].vehicle_data.get("gps"),
            Some(&VehicleDataResultCode::Success)
        );
        assert!(handler.holders().holds(AppId(2), &"gps".to_string()));
        assert_eq!(handler.pending().count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_partial_response_sends_remaining_items_for_next() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps", "speed"]), &mut ctx);
        handler.process_resumption(AppId(2), &saved(&["gps", "rpm"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();

        let response = HmiResponse::success(key).with_vehicle_data([
            ("gps".to_string(), VehicleDataResultCode::Success),
            ("speed".to_string(), VehicleDataResultCode::DataNotAvailable),
        ]);
        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&response, &mut ctx);
        let (actions, raised) = ctx.into_parts();

        // App 1 finished with a failed item.
        assert_eq!(raised.len(), 1);
        assert_eq!(
            raised[0].vehicle_data.get("speed"),
            Some(&VehicleDataResultCode::DataNotAvailable)
        );

        // App 2 only asks for what gps did not cover.
        let sent = sent(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].app_id, AppId(2));
        assert_eq!(requested_items(&sent[0]), vec!["rpm"]);
    }

    #[traced_test]
    #[test]
    fn test_failed_response_reports_not_subscribed() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(
            &HmiResponse::negative(key, ResultCode::GenericError, "timed out"),
            &mut ctx,
        );
        let (_, raised) = ctx.into_parts();

        assert_eq!(raised.len(), 1);
        assert!(raised[0].is_successful());
        assert_eq!(
            raised[0].vehicle_data.get("gps"),
            Some(&VehicleDataResultCode::DataNotSubscribed)
        );
        assert!(!handler.holders().is_held(&"gps".to_string()));
    }

    #[traced_test]
    #[test]
    fn test_held_items_finish_immediately() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();
        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&HmiResponse::success(key), &mut ctx);
        ctx.into_parts();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(2), &saved(&["gps"]), &mut ctx);
        let (actions, raised) = ctx.into_parts();
        assert!(sent(&actions).is_empty());
        assert_eq!(raised.len(), 1);
    }

    #[traced_test]
    #[test]
    fn test_revert_keeps_items_other_applications_hold() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps", "speed"]), &mut ctx);
        handler.process_resumption(AppId(2), &saved(&["gps"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();
        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&HmiResponse::success(key), &mut ctx);
        ctx.into_parts();

        let keys = RevertSet {
            vehicle_data: ["gps".to_string(), "speed".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.revert_resumption(AppId(1), &keys, &mut ctx);
        let (actions, _) = ctx.into_parts();

        let sent = sent(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].params(),
            &RequestParams::UnsubscribeVehicleData {
                keys: vec!["speed".to_string()]
            }
        );
    }

    #[traced_test]
    #[test]
    fn test_rejected_response_ignores_item_codes() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();

        let rejected = HmiResponse::new(key, ResultCode::Rejected)
            .with_vehicle_data([("gps".to_string(), VehicleDataResultCode::Success)]);
        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&rejected, &mut ctx);
        let (_, raised) = ctx.into_parts();

        assert_eq!(raised.len(), 1);
        assert_eq!(
            raised[0].vehicle_data.get("gps"),
            Some(&VehicleDataResultCode::DataNotSubscribed)
        );
        assert!(!handler.holders().is_held(&"gps".to_string()));
    }

    #[traced_test]
    #[test]
    fn test_orphaned_front_unsubscribes_unused_items() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps", "speed"]), &mut ctx);
        handler.process_resumption(AppId(2), &saved(&["gps"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.remove_consumer(AppId(1), &mut ctx);
        assert!(sent(&ctx.into_parts().0).is_empty());
        assert!(handler.owns(&key));

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&HmiResponse::success(key), &mut ctx);
        let (actions, raised) = ctx.into_parts();

        // App 2 keeps gps; nobody wants speed any more.
        assert_eq!(raised.len(), 2);
        assert!(handler.holders().holds(AppId(2), &"gps".to_string()));
        assert!(!handler.holders().holds(AppId(1), &"gps".to_string()));
        let sent = sent(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].app_id, AppId(1));
        assert_eq!(
            sent[0].params(),
            &RequestParams::UnsubscribeVehicleData {
                keys: vec!["speed".to_string()]
            }
        );
    }

    #[traced_test]
    #[test]
    fn test_removed_queued_application_is_never_requested() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps"]), &mut ctx);
        handler.process_resumption(AppId(2), &saved(&["speed"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.remove_consumer(AppId(2), &mut ctx);
        assert!(ctx.into_parts().0.is_empty());

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&HmiResponse::new(key, ResultCode::Rejected), &mut ctx);
        let (actions, raised) = ctx.into_parts();

        assert!(sent(&actions).is_empty());
        assert_eq!(raised.len(), 1);
        assert_eq!(handler.pending().count(), 0);
    }

    #[traced_test]
    #[test]
    fn test_removing_last_holder_unsubscribes() {
        let mut handler = VehicleDataResumptionHandler::new();
        let mut ledger = make_ledger();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.process_resumption(AppId(1), &saved(&["gps"]), &mut ctx);
        let (actions, _) = ctx.into_parts();
        let key = sent(&actions)[0].correlation_key().unwrap();
        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.on_response(&HmiResponse::success(key), &mut ctx);
        ctx.into_parts();

        let mut ctx = ResumptionContext::new(&mut ledger);
        handler.remove_consumer(AppId(1), &mut ctx);
        let (actions, _) = ctx.into_parts();

        let sent = sent(&actions);
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].params(),
            &RequestParams::UnsubscribeVehicleData {
                keys: vec!["gps".to_string()]
            }
        );
        assert!(handler.holders().is_empty());
    }
}
