//! Async runner around the resumption state machine.
//!
//! One tokio task owns the [`ResumptionStateMachine`] and every shared map
//! in it. Callers talk to it through a cloneable [`ResumptionHandle`] over an
//! mpsc channel, so the state machine never needs a lock. The runner
//! performs the returned actions: it hands messages to the transport, arms
//! response timers, and invokes completion callbacks.

use crate::{telemetry, ConfigError, HmiTransport, ResumptionObserver, RunnerConfig, RunnerError};
use resumption_core::{Action, Event, RestoreId, StateMachine};
use resumption_messages::{HmiMessage, HmiResponse};
use resumption_node::ResumptionStateMachine;
use resumption_pending::PendingResumptionHandler;
use resumption_types::{AppId, CorrelationKey, ResumptionResult, SavedApplication};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace, warn, Dispatch};

/// Invoked exactly once when a resumption finishes.
///
/// Dropped without being invoked when the application disconnects or the
/// HMI session closes first.
pub type CompletionCallback = Box<dyn FnOnce(ResumptionResult, String) + Send + 'static>;

enum Command {
    Restore {
        app_id: AppId,
        saved: Box<SavedApplication>,
        callback: CompletionCallback,
    },
    Response(HmiResponse),
    Disconnected(AppId),
    SessionClosed,
    Shutdown,
}

/// A response timer fired. Stale generations are ignored.
struct TimerFired {
    key: CorrelationKey,
    generation: u64,
}

/// Cloneable handle for talking to a running [`ResumptionRunner`].
#[derive(Debug, Clone)]
pub struct ResumptionHandle {
    commands: mpsc::Sender<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Restore { app_id, .. } => write!(f, "Restore({app_id})"),
            Command::Response(response) => write!(f, "Response({})", response.key()),
            Command::Disconnected(app_id) => write!(f, "Disconnected({app_id})"),
            Command::SessionClosed => f.write_str("SessionClosed"),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl ResumptionHandle {
    async fn send(&self, command: Command) -> Result<(), RunnerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RunnerError::Shutdown)
    }

    /// Restore `saved` for `app_id`, reporting the outcome to `callback`.
    pub async fn restore_with(
        &self,
        app_id: AppId,
        saved: SavedApplication,
        callback: CompletionCallback,
    ) -> Result<(), RunnerError> {
        self.send(Command::Restore {
            app_id,
            saved: Box::new(saved),
            callback,
        })
        .await
    }

    /// Restore `saved` for `app_id` and wait for the outcome.
    pub async fn restore(
        &self,
        app_id: AppId,
        saved: SavedApplication,
    ) -> Result<(ResumptionResult, String), RunnerError> {
        let (tx, rx) = oneshot::channel();
        let callback: CompletionCallback = Box::new(move |result, info| {
            let _ = tx.send((result, info));
        });
        self.restore_with(app_id, saved, callback).await?;
        rx.await.map_err(|_| RunnerError::Abandoned)
    }

    /// Deliver a response from the HMI.
    pub async fn on_response(&self, response: HmiResponse) -> Result<(), RunnerError> {
        self.send(Command::Response(response)).await
    }

    pub async fn application_disconnected(&self, app_id: AppId) -> Result<(), RunnerError> {
        self.send(Command::Disconnected(app_id)).await
    }

    pub async fn session_closed(&self) -> Result<(), RunnerError> {
        self.send(Command::SessionClosed).await
    }

    /// Stop the runner. Pending callbacks are dropped.
    pub async fn shutdown(&self) -> Result<(), RunnerError> {
        self.send(Command::Shutdown).await
    }
}

/// Owns the state machine and performs its actions.
pub struct ResumptionRunner {
    state: ResumptionStateMachine,
    transport: Arc<dyn HmiTransport>,
    observer: Arc<dyn ResumptionObserver>,
    dispatch: Option<Dispatch>,

    commands: mpsc::Receiver<Command>,

    /// Pending completion callbacks: restore id -> callback.
    callbacks: HashMap<RestoreId, CompletionCallback>,
    next_restore_id: u64,

    /// Armed response timers: key -> (generation, sleeping task).
    timers: HashMap<CorrelationKey, (u64, JoinHandle<()>)>,
    next_timer_generation: u64,
    timer_tx: mpsc::UnboundedSender<TimerFired>,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,

    started: Instant,
}

impl ResumptionRunner {
    /// Create a runner with the built-in subscription handlers.
    pub fn new(
        config: &RunnerConfig,
        transport: Arc<dyn HmiTransport>,
        observer: Arc<dyn ResumptionObserver>,
    ) -> (Self, ResumptionHandle) {
        let state = ResumptionStateMachine::new(config.resumption.clone());
        Self::with_state(config, state, transport, observer)
    }

    /// Create a runner with the built-in subscription handlers that logs
    /// through a dispatch built from `config.log_filter`.
    pub fn from_config(
        config: &RunnerConfig,
        transport: Arc<dyn HmiTransport>,
        observer: Arc<dyn ResumptionObserver>,
    ) -> Result<(Self, ResumptionHandle), ConfigError> {
        config.validate()?;
        let dispatch = telemetry::build_dispatch(&config.log_filter)?;
        let (runner, handle) = Self::new(config, transport, observer);
        Ok((runner.with_dispatch(dispatch), handle))
    }

    /// Create a runner with a custom set of subscription handlers.
    pub fn with_handlers(
        config: &RunnerConfig,
        handlers: Vec<Box<dyn PendingResumptionHandler>>,
        transport: Arc<dyn HmiTransport>,
        observer: Arc<dyn ResumptionObserver>,
    ) -> (Self, ResumptionHandle) {
        let state = ResumptionStateMachine::with_handlers(config.resumption.clone(), handlers);
        Self::with_state(config, state, transport, observer)
    }

    fn with_state(
        config: &RunnerConfig,
        state: ResumptionStateMachine,
        transport: Arc<dyn HmiTransport>,
        observer: Arc<dyn ResumptionObserver>,
    ) -> (Self, ResumptionHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let runner = Self {
            state,
            transport,
            observer,
            dispatch: None,
            commands: command_rx,
            callbacks: HashMap::new(),
            next_restore_id: 0,
            timers: HashMap::new(),
            next_timer_generation: 0,
            timer_tx,
            timer_rx,
            started: Instant::now(),
        };
        (
            runner,
            ResumptionHandle {
                commands: command_tx,
            },
        )
    }

    /// Log through `dispatch` instead of the global default.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Run on a new tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands and timers until shut down or every handle is
    /// dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                Some(fired) = self.timer_rx.recv() => self.on_timer_fired(fired),
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
            }
        }

        for (_, (_, timer)) in self.timers.drain() {
            timer.abort();
        }
        self.in_scope(|| {
            debug!(
                dropped_callbacks = self.callbacks.len(),
                "Resumption runner stopped"
            )
        });
    }

    fn in_scope<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }

    fn on_command(&mut self, command: Command) {
        self.in_scope(|| trace!(command = ?command, "Runner command"));
        let event = match command {
            Command::Restore {
                app_id,
                saved,
                callback,
            } => {
                let restore_id = RestoreId::new(self.next_restore_id);
                self.next_restore_id += 1;
                self.callbacks.insert(restore_id, callback);
                Event::RestoreRequested {
                    restore_id,
                    app_id,
                    saved,
                }
            }
            Command::Response(response) => Event::HmiResponseReceived { response },
            Command::Disconnected(app_id) => Event::ApplicationDisconnected { app_id },
            Command::SessionClosed => Event::SessionClosed,
            Command::Shutdown => return,
        };
        self.process(event);
    }

    fn on_timer_fired(&mut self, fired: TimerFired) {
        match self.timers.get(&fired.key) {
            Some((generation, _)) if *generation == fired.generation => {
                self.timers.remove(&fired.key);
                self.process(Event::ResponseTimedOut { key: fired.key });
            }
            _ => self.in_scope(|| trace!(key = %fired.key, "Stale timer")),
        }
    }

    /// Feed `event` to the state machine and perform the resulting actions,
    /// including events those actions cause.
    fn process(&mut self, event: Event) {
        let mut events = VecDeque::from([event]);
        while let Some(event) = events.pop_front() {
            self.state.set_time(self.started.elapsed());
            let actions = match &self.dispatch {
                Some(dispatch) => {
                    tracing::dispatcher::with_default(dispatch, || self.state.handle(event))
                }
                None => self.state.handle(event),
            };
            for action in actions {
                if let Some(followup) = self.perform(action) {
                    events.push_back(followup);
                }
            }
        }
    }

    fn perform(&mut self, action: Action) -> Option<Event> {
        match action {
            Action::SendToHmi { message } => return self.send_to_hmi(message),
            Action::SetTimer { key, duration } => {
                self.cancel_timer(&key);
                let generation = self.next_timer_generation;
                self.next_timer_generation += 1;
                let timer_tx = self.timer_tx.clone();
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(duration).await;
                    let _ = timer_tx.send(TimerFired { key, generation });
                });
                self.timers.insert(key, (generation, timer));
            }
            Action::CancelTimer { key } => self.cancel_timer(&key),
            Action::ResumptionFinished {
                restore_id,
                app_id,
                result,
                info,
            } => match self.callbacks.remove(&restore_id) {
                Some(callback) => callback(result, info),
                None => self.in_scope(|| {
                    warn!(restore_id = %restore_id, app_id = %app_id, "No callback for finished resumption")
                }),
            },
            Action::RestoreAbandoned { restore_id, app_id } => {
                if self.callbacks.remove(&restore_id).is_some() {
                    self.in_scope(|| {
                        debug!(restore_id = %restore_id, app_id = %app_id, "Dropped completion callback")
                    });
                }
            }
            Action::ResumePostponedWindows { app_id } => {
                self.observer.resume_postponed_windows(app_id)
            }
            Action::DropPostponedWindows { app_id } => self.observer.drop_postponed_windows(app_id),
            Action::ResetDisplayCapabilities { app_id, window_id } => {
                self.observer.reset_display_capabilities(app_id, window_id)
            }
        }
        None
    }

    fn send_to_hmi(&mut self, message: HmiMessage) -> Option<Event> {
        if self.transport.send(&message) {
            return None;
        }
        let key = message.correlation_key();
        self.in_scope(|| {
            warn!(
                app_id = %message.app_id,
                function = message.function().name(),
                "Transport refused message"
            )
        });
        // Refused notifications need no follow-up.
        let key = key.filter(|_| !message.function().is_notification())?;
        Some(Event::DispatchFailed { key })
    }

    fn cancel_timer(&mut self, key: &CorrelationKey) {
        if let Some((_, timer)) = self.timers.remove(key) {
            timer.abort();
        }
    }
}
