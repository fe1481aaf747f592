//! Composed resumption state machine.

use crate::{ResumptionConfig, RestoredRecord};
use resumption_core::{Action, Event, RestoreId, StateMachine};
use resumption_ledger::{CorrelationRegistry, RequestLedger};
use resumption_messages::HmiResponse;
use resumption_pending::{
    AppServiceResumptionHandler, ModuleResumptionHandler, PendingResumptionHandler,
    ResumptionContext, VehicleDataResumptionHandler, WayPointsResumptionHandler,
};
use resumption_types::AppId;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Restores saved application state on the HMI.
///
/// Owns the correlation registry, the request ledger and every
/// pending-resumption handler, so one `handle` call sees all shared maps at
/// once. Restoring lives in `coordinator`, response routing in `router`.
pub struct ResumptionStateMachine {
    pub(crate) config: ResumptionConfig,

    pub(crate) ledger: RequestLedger,

    /// Consulted in order. The first handler owning a key gets its response.
    pub(crate) handlers: Vec<Box<dyn PendingResumptionHandler>>,

    /// Ticket of every application currently restoring.
    pub(crate) in_progress: HashMap<AppId, RestoreId>,

    pub(crate) restored: HashMap<AppId, RestoredRecord>,

    /// Responses synthesized by handlers, resolved before `handle` returns.
    pub(crate) raised: VecDeque<HmiResponse>,

    now: Duration,
}

impl std::fmt::Debug for ResumptionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumptionStateMachine")
            .field("config", &self.config)
            .field("ledger", &self.ledger)
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("in_progress", &self.in_progress)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl ResumptionStateMachine {
    /// Create a state machine with the built-in subscription handlers.
    pub fn new(config: ResumptionConfig) -> Self {
        Self::with_handlers(config, default_handlers())
    }

    /// Create a state machine with a custom set of handlers.
    pub fn with_handlers(
        config: ResumptionConfig,
        handlers: Vec<Box<dyn PendingResumptionHandler>>,
    ) -> Self {
        let registry =
            CorrelationRegistry::new(config.first_correlation_id, config.max_correlation_id);
        let ledger = RequestLedger::new(registry, config.response_timeout());
        Self {
            config,
            ledger,
            handlers,
            in_progress: HashMap::new(),
            restored: HashMap::new(),
            raised: VecDeque::new(),
            now: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &ResumptionConfig {
        &self.config
    }

    pub fn ledger(&self) -> &RequestLedger {
        &self.ledger
    }

    /// Whether `app_id` has a resumption in progress.
    pub fn is_restoring(&self, app_id: AppId) -> bool {
        self.in_progress.contains_key(&app_id)
    }

    /// What resumption restored for `app_id`, if anything is kept.
    pub fn restored_record(&self, app_id: AppId) -> Option<&RestoredRecord> {
        self.restored.get(&app_id)
    }

    /// Handlers in routing order.
    pub fn handlers(&self) -> impl Iterator<Item = &dyn PendingResumptionHandler> {
        self.handlers.iter().map(|h| h.as_ref())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Handler plumbing
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run `f` on handler `index` with a context over the ledger.
    pub(crate) fn with_handler<F>(&mut self, index: usize, actions: &mut Vec<Action>, f: F)
    where
        F: FnOnce(&mut dyn PendingResumptionHandler, &mut ResumptionContext<'_>),
    {
        let Some(handler) = self.handlers.get_mut(index) else {
            return;
        };
        let mut ctx = ResumptionContext::new(&mut self.ledger);
        f(handler.as_mut(), &mut ctx);
        let (handler_actions, raised) = ctx.into_parts();
        actions.extend(handler_actions);
        self.raised.extend(raised);
    }

    /// Run `f` on every handler, in order.
    pub(crate) fn with_each_handler<F>(&mut self, actions: &mut Vec<Action>, mut f: F)
    where
        F: FnMut(&mut dyn PendingResumptionHandler, &mut ResumptionContext<'_>),
    {
        for index in 0..self.handlers.len() {
            self.with_handler(index, actions, &mut f);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Teardown
    // ═══════════════════════════════════════════════════════════════════════════

    /// Forget everything about a disconnected application.
    ///
    /// Outstanding ids are unregistered before anything else, so a late
    /// response is an unknown correlation. The completion callback is
    /// dropped without being invoked.
    pub fn on_application_disconnected(&mut self, app_id: AppId) -> Vec<Action> {
        let mut actions = self.ledger.cancel_consumer(app_id);
        self.with_each_handler(&mut actions, |handler, ctx| {
            handler.remove_consumer(app_id, ctx)
        });
        self.restored.remove(&app_id);
        if let Some(restore_id) = self.in_progress.remove(&app_id) {
            info!(app_id = %app_id, restore_id = %restore_id, "Resumption abandoned on disconnect");
            actions.push(Action::RestoreAbandoned { restore_id, app_id });
        }
        self.drain_raised(&mut actions);
        actions
    }

    /// Abandon every resumption after the HMI session went away.
    pub fn on_session_closed(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        self.with_each_handler(&mut actions, |handler, ctx| {
            handler.clear_pending_resumption_requests(ctx)
        });
        actions.extend(self.ledger.cancel_all());
        // Synthesized responses have nobody left to resolve.
        self.raised.clear();

        let mut abandoned: Vec<(AppId, RestoreId)> = self.in_progress.drain().collect();
        abandoned.sort();
        for (app_id, restore_id) in abandoned {
            self.restored.remove(&app_id);
            actions.push(Action::RestoreAbandoned { restore_id, app_id });
        }
        info!(actions = actions.len(), "HMI session closed");
        actions
    }
}

/// Vehicle data, remote-control modules, way points and app services.
pub fn default_handlers() -> Vec<Box<dyn PendingResumptionHandler>> {
    vec![
        Box::new(VehicleDataResumptionHandler::new()),
        Box::new(ModuleResumptionHandler::new()),
        Box::new(WayPointsResumptionHandler::new()),
        Box::new(AppServiceResumptionHandler::new()),
    ]
}

impl StateMachine for ResumptionStateMachine {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        trace!(event = event.type_name(), "Handling event");
        let actions = match event {
            Event::RestoreRequested {
                restore_id,
                app_id,
                saved,
            } => self.on_restore(restore_id, app_id, &saved),
            Event::HmiResponseReceived { response } => self.on_hmi_response(response),
            Event::ResponseTimedOut { key } => self.on_response_timeout(key),
            Event::DispatchFailed { key } => self.on_dispatch_failed(key),
            Event::ApplicationDisconnected { app_id } => self.on_application_disconnected(app_id),
            Event::SessionClosed => self.on_session_closed(),
        };
        debug!(actions = actions.len(), "Event handled");
        actions
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }
}
