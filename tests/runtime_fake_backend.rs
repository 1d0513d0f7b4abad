// tests/runtime_fake_backend.rs
//
// Drives the full async runtime (inbox, debounce timer, command execution)
// against a fake process backend, with the Tokio clock paused so timing is
// deterministic.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::advance;

use watchrun::config::Settings;
use watchrun::engine::{
    BuildOutcome, CoreConfig, DebounceTimer, EngineCore, EngineEvent, Runtime,
};
use watchrun::errors::WatchrunError;
use watchrun::watch::AddressingMode;
use watchrun_test_utils::fake_backend::{ActionLog, BackendAction, FakeBackend};
use watchrun_test_utils::{init_tracing, with_timeout};

const DEBOUNCE: Duration = Duration::from_millis(200);
const RESTART: Duration = Duration::from_secs(2);

fn settings() -> Settings {
    Settings {
        build_cmd: vec!["make".to_string()],
        run_cmd: vec!["./server".to_string()],
        debounce_delay: DEBOUNCE,
        restart_delay: RESTART,
        targets: vec!["src/*.c".to_string()],
        mode: AddressingMode::Glob,
    }
}

type RuntimeHandle = JoinHandle<watchrun::errors::Result<()>>;

fn spawn_runtime(
    settings: &Settings,
    backend: FakeBackend,
) -> (mpsc::Sender<EngineEvent>, RuntimeHandle) {
    let (tx, rx) = mpsc::channel::<EngineEvent>(64);
    let core = EngineCore::new(CoreConfig {
        has_build: !settings.build_cmd.is_empty(),
        has_run: !settings.run_cmd.is_empty(),
        debounce_delay: settings.debounce_delay,
        restart_delay: settings.restart_delay,
    });
    let timer = DebounceTimer::new(tx.clone());
    let runtime = Runtime::new(core, settings, rx, timer, backend);
    (tx, tokio::spawn(runtime.run()))
}

/// Let every runnable task make progress (single-threaded test runtime).
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

fn build() -> BackendAction {
    BackendAction::Build(vec!["make".to_string()])
}

fn start(run: u64) -> BackendAction {
    BackendAction::Start {
        run,
        cmd: vec!["./server".to_string()],
    }
}

fn actions_of(log: &ActionLog) -> Vec<BackendAction> {
    log.lock().unwrap().clone()
}

async fn change(tx: &mpsc::Sender<EngineEvent>, path: &str) {
    tx.send(EngineEvent::PathChanged { path: path.into() })
        .await
        .unwrap();
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn startup_cycle_builds_and_runs_immediately() {
    init_tracing();
    let (backend, log) = FakeBackend::new();
    let (tx, handle) = spawn_runtime(&settings(), backend);

    settle().await;
    assert_eq!(actions_of(&log), vec![build(), start(0)]);

    tx.send(EngineEvent::ShutdownRequested).await.unwrap();
    let result = with_timeout(handle).await.unwrap();
    assert!(result.is_ok());
    assert_eq!(actions_of(&log), vec![build(), start(0), BackendAction::Kill(0)]);
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_produces_exactly_one_cycle() {
    init_tracing();
    let (backend, log) = FakeBackend::new();
    let (tx, _handle) = spawn_runtime(&settings(), backend);
    settle().await;

    // Three changes at t=0, t=50ms, t=120ms, all within one 200ms window.
    change(&tx, "/proj/src/a.c").await;
    advance(Duration::from_millis(50)).await;
    change(&tx, "/proj/src/b.c").await;
    advance(Duration::from_millis(70)).await;
    change(&tx, "/proj/src/c.c").await;

    // 200ms after the last change, exactly one rebuild cycle runs, with one
    // graceful interrupt before the forceful kill.
    advance(DEBOUNCE).await;
    settle().await;
    assert_eq!(
        actions_of(&log),
        vec![
            build(),
            start(0),
            BackendAction::Interrupt(0),
            BackendAction::Kill(0),
            build(),
            start(1),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_build_suppresses_the_run_step() {
    init_tracing();
    let (mut backend, log) = FakeBackend::new();
    backend.script_build_outcome(BuildOutcome::Failed(1));
    let (tx, _handle) = spawn_runtime(&settings(), backend);
    settle().await;

    // Startup build failed: no run process was started.
    assert_eq!(actions_of(&log), vec![build()]);

    // The next change retries the whole cycle; this build succeeds.
    change(&tx, "/proj/src/a.c").await;
    advance(DEBOUNCE).await;
    settle().await;
    assert_eq!(actions_of(&log), vec![build(), build(), start(0)]);
}

#[tokio::test(start_paused = true)]
async fn crash_restarts_after_cooldown_without_a_change() {
    init_tracing();
    let (backend, log) = FakeBackend::new();
    let (tx, _handle) = spawn_runtime(&settings(), backend);
    settle().await;

    tx.send(EngineEvent::RunExited {
        run: 0,
        code: Some(1),
    })
    .await
    .unwrap();
    settle().await;

    // Nothing happens until the restart cooldown elapses.
    assert_eq!(actions_of(&log), vec![build(), start(0)]);

    advance(RESTART).await;
    settle().await;
    assert_eq!(actions_of(&log), vec![build(), start(0), build(), start(1)]);
}

#[tokio::test(start_paused = true)]
async fn stale_exit_events_are_ignored() {
    init_tracing();
    let (backend, log) = FakeBackend::new();
    let (tx, _handle) = spawn_runtime(&settings(), backend);
    settle().await;

    // Replace run 0 with run 1 via a normal change cycle.
    change(&tx, "/proj/src/a.c").await;
    advance(DEBOUNCE).await;
    settle().await;
    let after_replace = actions_of(&log);
    assert_eq!(*after_replace.last().unwrap(), start(1));

    // The replaced process's exit event arrives late; it must not trigger a
    // cooldown rebuild.
    tx.send(EngineEvent::RunExited { run: 0, code: None })
        .await
        .unwrap();
    settle().await;
    advance(RESTART * 2).await;
    settle().await;
    assert_eq!(actions_of(&log), after_replace);
}

#[tokio::test(start_paused = true)]
async fn watch_source_failure_is_fatal() {
    init_tracing();
    let (backend, _log) = FakeBackend::new();
    let (tx, handle) = spawn_runtime(&settings(), backend);
    settle().await;

    tx.send(EngineEvent::WatchFailed {
        message: "inotify queue overflowed".to_string(),
    })
    .await
    .unwrap();

    let result = with_timeout(handle).await.unwrap();
    assert!(matches!(result, Err(WatchrunError::WatchSource(_))));
}
