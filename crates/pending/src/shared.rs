//! Generic handler for subscriptions to shared HMI resources.

use crate::freeze::{Admission, FreezeQueue, QueuePolicy, Waiter};
use crate::handler::{PendingResumptionHandler, ResumptionContext, RevertSet};
use crate::subscriptions::SubscriptionIndex;
use indexmap::IndexSet;
use resumption_messages::{Directive, HmiResponse};
use resumption_types::{AppId, CorrelationKey, ResourceKey, ResultCode, SavedSubscriptions};
use std::marker::PhantomData;
use tracing::{debug, trace, warn};

/// Resource semantics plugged into [`SubscriptionHandler`].
pub trait SubscriptionScheme: Send + 'static {
    /// Short name used in logs.
    const NAME: &'static str;

    /// Whether consumers share one outstanding request per resource.
    const POLICY: QueuePolicy;

    /// Resources of this kind in the saved subscriptions.
    fn requested(saved: &SavedSubscriptions) -> Vec<ResourceKey>;

    /// Resources of this kind among the restored subscriptions.
    fn reverted(keys: &RevertSet) -> Vec<ResourceKey>;

    fn subscribe(resource: &ResourceKey) -> Directive;

    fn unsubscribe(resource: &ResourceKey) -> Directive;
}

/// Restores one kind of resource subscription through a [`FreezeQueue`].
#[derive(Debug)]
pub struct SubscriptionHandler<S> {
    queue: FreezeQueue,
    holders: SubscriptionIndex<ResourceKey>,
    _scheme: PhantomData<fn() -> S>,
}

impl<S: SubscriptionScheme> Default for SubscriptionHandler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SubscriptionScheme> SubscriptionHandler<S> {
    pub fn new() -> Self {
        Self {
            queue: FreezeQueue::new(S::POLICY),
            holders: SubscriptionIndex::new(),
            _scheme: PhantomData,
        }
    }

    pub fn queue(&self) -> &FreezeQueue {
        &self.queue
    }

    pub fn holders(&self) -> &SubscriptionIndex<ResourceKey> {
        &self.holders
    }

    /// Send the outstanding request of `waiter`.
    ///
    /// If it cannot be sent, the waiter fails right away and the next frozen
    /// waiter is tried.
    fn send_outstanding(&mut self, waiter: Waiter, ctx: &mut ResumptionContext<'_>) {
        let mut next = Some(waiter);
        while let Some(waiter) = next.take() {
            let key = waiter.key;
            if ctx.send_awaited(waiter.message).is_some() {
                return;
            }
            warn!(handler = S::NAME, key = %key, "Failed to send subscription request");
            ctx.raise(HmiResponse::negative(
                key,
                ResultCode::GenericError,
                "Subscription request could not be sent",
            ));
            next = self
                .queue
                .on_outstanding_resolved(&key, false)
                .and_then(|resolved| resolved.promoted);
        }
    }

    /// Undo a subscription the HMI granted to a consumer that is gone.
    fn release_orphaned(&mut self, app_id: AppId, resource: &ResourceKey, ctx: &mut ResumptionContext<'_>) {
        if S::POLICY == QueuePolicy::Shared && self.holders.is_held(resource) {
            trace!(handler = S::NAME, resource = %resource, "Orphaned subscription still held");
            return;
        }
        debug!(
            handler = S::NAME,
            app_id = %app_id,
            resource = %resource,
            "Unsubscribing orphaned subscription"
        );
        ctx.send_untracked(app_id, S::unsubscribe(resource));
    }
}

impl<S: SubscriptionScheme> PendingResumptionHandler for SubscriptionHandler<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn process_resumption(
        &mut self,
        app_id: AppId,
        saved: &SavedSubscriptions,
        ctx: &mut ResumptionContext<'_>,
    ) {
        // Collapse duplicates within one call before queuing.
        let requested: IndexSet<ResourceKey> = S::requested(saved).into_iter().collect();

        for resource in requested {
            if self.queue.is_pending(app_id, &resource) {
                debug!(handler = S::NAME, app_id = %app_id, resource = %resource, "Already pending");
                continue;
            }
            let Some(message) = ctx.register_pending(app_id, S::subscribe(&resource)) else {
                continue;
            };
            let Some(key) = message.correlation_key() else {
                continue;
            };

            if S::POLICY == QueuePolicy::Shared && self.holders.is_held(&resource) {
                debug!(
                    handler = S::NAME,
                    app_id = %app_id,
                    resource = %resource,
                    "Resource already subscribed on the HMI"
                );
                self.holders.add(app_id, resource);
                ctx.raise(HmiResponse::success(key));
                continue;
            }

            let waiter = Waiter {
                app_id,
                key,
                message,
            };
            match self.queue.request_subscription(resource.clone(), waiter.clone()) {
                Admission::Dispatch => {
                    debug!(
                        handler = S::NAME,
                        app_id = %app_id,
                        key = %key,
                        resource = %resource,
                        "Sending subscription request"
                    );
                    self.send_outstanding(waiter, ctx);
                }
                Admission::Frozen => {
                    debug!(
                        handler = S::NAME,
                        app_id = %app_id,
                        key = %key,
                        resource = %resource,
                        "Froze subscription request"
                    );
                }
                Admission::Duplicate => {
                    ctx.raise(HmiResponse::negative(
                        key,
                        ResultCode::Ignored,
                        "Duplicate subscription request",
                    ));
                }
            }
        }
    }

    fn owns(&self, key: &CorrelationKey) -> bool {
        self.queue.owns(key)
    }

    fn on_response(&mut self, response: &HmiResponse, ctx: &mut ResumptionContext<'_>) {
        let key = response.key();
        ctx.release(key);

        let success = response.is_successful();
        let Some(resolved) = self.queue.on_outstanding_resolved(&key, success) else {
            debug!(handler = S::NAME, key = %key, "Not waiting for this response");
            return;
        };

        if success {
            debug!(
                handler = S::NAME,
                resource = %resolved.resource,
                replays = resolved.replay_to.len(),
                "Subscription restored"
            );
            if !resolved.orphaned {
                self.holders
                    .add(resolved.outstanding.app_id, resolved.resource.clone());
            }
            for waiter in resolved.replay_to {
                trace!(app_id = %waiter.app_id, key = %waiter.key, "Replaying response");
                self.holders.add(waiter.app_id, resolved.resource.clone());
                ctx.raise(response.readdressed(waiter.key.correlation_id));
            }
            if resolved.orphaned {
                self.release_orphaned(resolved.outstanding.app_id, &resolved.resource, ctx);
            }
        } else if let Some(next) = resolved.promoted {
            debug!(
                handler = S::NAME,
                resource = %resolved.resource,
                next_app_id = %next.app_id,
                next_key = %next.key,
                "Subscription failed, sending next frozen request"
            );
            self.send_outstanding(next, ctx);
        } else {
            debug!(
                handler = S::NAME,
                resource = %resolved.resource,
                "Subscription failed, nothing frozen"
            );
        }
    }

    fn revert_resumption(&mut self, app_id: AppId, keys: &RevertSet, ctx: &mut ResumptionContext<'_>) {
        for resource in S::reverted(keys) {
            let held = self.holders.holds(app_id, &resource);
            let released = self.holders.remove(app_id, &resource);
            if released || (held && S::POLICY == QueuePolicy::PassThrough) {
                debug!(handler = S::NAME, app_id = %app_id, resource = %resource, "Unsubscribing");
                ctx.send_untracked(app_id, S::unsubscribe(&resource));
            } else {
                debug!(
                    handler = S::NAME,
                    app_id = %app_id,
                    resource = %resource,
                    held,
                    "Subscription not released"
                );
            }
        }
    }

    fn remove_consumer(&mut self, app_id: AppId, ctx: &mut ResumptionContext<'_>) {
        // The consumer's timers were cancelled with its requests, but an
        // orphaned request still drives the frozen waiters behind it.
        for key in self.queue.outstanding_keys(app_id) {
            ctx.rearm(key);
        }
        let dropped = self.queue.remove_consumer(app_id);

        let held: Vec<ResourceKey> = self
            .holders
            .resources_of(app_id)
            .map(|resources| resources.iter().cloned().collect())
            .unwrap_or_default();
        let released = self.holders.remove_consumer(app_id);
        let unsubscribe = match S::POLICY {
            QueuePolicy::Shared => released,
            QueuePolicy::PassThrough => held,
        };
        for resource in &unsubscribe {
            ctx.send_untracked(app_id, S::unsubscribe(resource));
        }

        debug!(
            handler = S::NAME,
            app_id = %app_id,
            frozen = dropped.len(),
            unsubscribed = unsubscribe.len(),
            "Removed consumer"
        );
    }

    fn clear_pending_resumption_requests(&mut self, ctx: &mut ResumptionContext<'_>) {
        let cleared = self.queue.clear();
        for waiter in &cleared.outstanding {
            ctx.abandon(waiter.key);
        }
        debug!(
            handler = S::NAME,
            outstanding = cleared.outstanding.len(),
            frozen = cleared.frozen.len(),
            "Cleared pending resumption requests"
        );
    }
}
