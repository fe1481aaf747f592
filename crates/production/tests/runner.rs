//! Runner tests against a recording transport, with paused time.

use parking_lot::Mutex;
use resumption_messages::HmiMessage;
use resumption_production::{
    ConfigError, HmiTransport, NoopObserver, ResumptionHandle, ResumptionObserver,
    ResumptionRunner, RunnerConfig, RunnerError,
};
use resumption_test_helpers::fixtures;
use resumption_test_helpers::hmi::success;
use resumption_types::{AppId, ResumptionResult, SavedApplication, WindowId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Records every message; refuses them all when told to.
#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<HmiMessage>>,
    refuse: AtomicBool,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<HmiMessage> {
        self.sent.lock().clone()
    }
}

impl HmiTransport for RecordingTransport {
    fn send(&self, message: &HmiMessage) -> bool {
        if self.refuse.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().push(message.clone());
        true
    }
}

#[derive(Default)]
struct RecordingObserver {
    resumed: Mutex<Vec<AppId>>,
    dropped: Mutex<Vec<AppId>>,
    reset: Mutex<Vec<(AppId, WindowId)>>,
}

impl ResumptionObserver for RecordingObserver {
    fn resume_postponed_windows(&self, app_id: AppId) {
        self.resumed.lock().push(app_id);
    }

    fn drop_postponed_windows(&self, app_id: AppId) {
        self.dropped.lock().push(app_id);
    }

    fn reset_display_capabilities(&self, app_id: AppId, window_id: WindowId) {
        self.reset.lock().push((app_id, window_id));
    }
}

struct Setup {
    handle: ResumptionHandle,
    transport: Arc<RecordingTransport>,
    observer: Arc<RecordingObserver>,
}

fn start() -> Setup {
    let transport = Arc::new(RecordingTransport::default());
    let observer = Arc::new(RecordingObserver::default());
    let config = RunnerConfig::default().with_channel_capacity(8);
    let (runner, handle) = ResumptionRunner::new(&config, transport.clone(), observer.clone());
    runner.spawn();
    Setup {
        handle,
        transport,
        observer,
    }
}

fn submenus(ids: &[u32]) -> SavedApplication {
    SavedApplication {
        submenus: Some(ids.iter().map(|id| fixtures::submenu(*id)).collect()),
        ..Default::default()
    }
}

/// Wait until the transport has recorded at least `count` messages.
async fn wait_for_sent(transport: &RecordingTransport, count: usize) -> Vec<HmiMessage> {
    loop {
        let sent = transport.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_restore_completes_on_response() {
    let setup = start();
    let handle = setup.handle.clone();
    let pending = tokio::spawn(async move { handle.restore(AppId(1), submenus(&[1])).await });

    let sent = wait_for_sent(&setup.transport, 1).await;
    setup.handle.on_response(success(&sent[0])).await.unwrap();

    let (result, info) = pending.await.unwrap().unwrap();
    assert_eq!(result, ResumptionResult::Success);
    assert_eq!(info, "Data resumption succeeded");
    assert_eq!(*setup.observer.resumed.lock(), vec![AppId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_nothing_to_restore_completes_immediately() {
    let setup = start();

    let (result, _) = setup
        .handle
        .restore(AppId(1), SavedApplication::default())
        .await
        .unwrap();

    assert_eq!(result, ResumptionResult::Success);
    assert!(setup.transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_request_times_out() {
    let setup = start();
    let started = tokio::time::Instant::now();

    let (result, info) = setup.handle.restore(AppId(1), submenus(&[1])).await.unwrap();

    assert_eq!(result, ResumptionResult::ResumeFailed);
    assert!(info.starts_with("Data resumption failed"));
    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(*setup.observer.dropped.lock(), vec![AppId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_answered_request_does_not_time_out_later() {
    let setup = start();
    let handle = setup.handle.clone();
    let pending = tokio::spawn(async move { handle.restore(AppId(1), submenus(&[1, 2])).await });

    let sent = wait_for_sent(&setup.transport, 2).await;
    setup.handle.on_response(success(&sent[0])).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    setup.handle.on_response(success(&sent[1])).await.unwrap();

    let (result, _) = pending.await.unwrap().unwrap();
    assert_eq!(result, ResumptionResult::Success);
}

#[tokio::test(start_paused = true)]
async fn test_refused_dispatch_fails_immediately() {
    let setup = start();
    setup.transport.refuse.store(true, Ordering::SeqCst);
    let started = tokio::time::Instant::now();

    let (result, _) = setup.handle.restore(AppId(1), submenus(&[1])).await.unwrap();

    assert_eq!(result, ResumptionResult::ResumeFailed);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_failed_window_resets_display_capabilities() {
    let setup = start();
    let handle = setup.handle.clone();
    let saved = SavedApplication {
        windows: Some(vec![fixtures::widget(3)]),
        ..Default::default()
    };
    let pending = tokio::spawn(async move { handle.restore(AppId(1), saved).await });

    let sent = wait_for_sent(&setup.transport, 1).await;
    let rejected = resumption_test_helpers::hmi::answer(
        &sent[0],
        resumption_types::ResultCode::Rejected,
    );
    setup.handle.on_response(rejected).await.unwrap();

    let (result, _) = pending.await.unwrap().unwrap();
    assert_eq!(result, ResumptionResult::ResumeFailed);
    assert_eq!(*setup.observer.reset.lock(), vec![(AppId(1), WindowId(3))]);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_abandons_the_caller() {
    let setup = start();
    let handle = setup.handle.clone();
    let pending = tokio::spawn(async move { handle.restore(AppId(1), submenus(&[1])).await });

    wait_for_sent(&setup.transport, 1).await;
    setup
        .handle
        .application_disconnected(AppId(1))
        .await
        .unwrap();

    assert_eq!(pending.await.unwrap(), Err(RunnerError::Abandoned));
}

#[tokio::test(start_paused = true)]
async fn test_session_closed_abandons_every_caller() {
    let setup = start();
    let first = {
        let handle = setup.handle.clone();
        tokio::spawn(async move { handle.restore(AppId(1), submenus(&[1])).await })
    };
    let second = {
        let handle = setup.handle.clone();
        tokio::spawn(async move { handle.restore(AppId(2), submenus(&[2])).await })
    };

    wait_for_sent(&setup.transport, 2).await;
    setup.handle.session_closed().await.unwrap();

    assert_eq!(first.await.unwrap(), Err(RunnerError::Abandoned));
    assert_eq!(second.await.unwrap(), Err(RunnerError::Abandoned));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_rejects_further_commands() {
    let setup = start();
    setup.handle.shutdown().await.unwrap();

    // Let the runner observe the shutdown and drop its receiver.
    tokio::time::sleep(Duration::from_millis(1)).await;

    let result = setup.handle.restore(AppId(1), submenus(&[1])).await;
    assert_eq!(result, Err(RunnerError::Shutdown));
}

#[tokio::test(start_paused = true)]
async fn test_from_config_logs_through_configured_filter() {
    let transport = Arc::new(RecordingTransport::default());
    let config = RunnerConfig::default().with_log_filter("resumption_node=debug,warn");
    let (runner, handle) =
        ResumptionRunner::from_config(&config, transport.clone(), Arc::new(NoopObserver))
            .unwrap();
    runner.spawn();

    let (result, _) = handle
        .restore(AppId(1), SavedApplication::default())
        .await
        .unwrap();
    assert_eq!(result, ResumptionResult::Success);
    assert!(transport.sent().is_empty());
}

#[test]
fn test_from_config_rejects_bad_log_filter() {
    let config = RunnerConfig::default().with_log_filter("resumption=notalevel");
    let result = ResumptionRunner::from_config(
        &config,
        Arc::new(RecordingTransport::default()),
        Arc::new(NoopObserver),
    );
    assert!(matches!(result.err(), Some(ConfigError::Invalid(_))));
}
