// src/engine/core.rs

//! Pure core engine state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`EngineEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the inbox channel
//! - arming the debounce timer
//! - running builds and (re)starting the run process via a `ProcessBackend`
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes. It is the sole writer of the
//! supervisor state; everything concurrent merely posts events.

use std::time::Duration;

use tracing::debug;

/// Identity of a debounce window. A fresh window supersedes the previous
/// one; an elapsed notification carrying a stale id is ignored.
pub type WindowId = u64;

/// Identity of a run-process instance. Exit events carrying a superseded id
/// are ignored.
pub type RunId = u64;

/// Result of the build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed(i32), // exit code
}

/// Events consumed by the core.
///
/// - the file watcher sends `PathChanged` (already match-filtered)
/// - the debounce timer sends `DelayElapsed`
/// - the shell feeds `BuildFinished` back in after a blocking build
/// - the process supervisor's exit waiter sends `RunExited`
/// - the watcher sends `WatchFailed` on delivery errors (fatal, handled by
///   the shell before it reaches the core)
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum EngineEvent {
    PathChanged { path: std::path::PathBuf },
    DelayElapsed { window: WindowId },
    BuildFinished { outcome: BuildOutcome },
    RunExited { run: RunId, code: Option<i32> },
    WatchFailed { message: String },
    ShutdownRequested,
}

/// Instructions for the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Cancel any outstanding window and schedule a new one.
    ArmWindow { window: WindowId, delay: Duration },
    /// Ask the run process to stop gracefully (sent at most once per
    /// process instance).
    InterruptRun { run: RunId },
    /// Force-kill the run process. Idempotent if it already exited.
    KillRun { run: RunId },
    /// Execute the build command to completion and feed the outcome back
    /// as [`EngineEvent::BuildFinished`].
    RunBuild,
    /// Spawn the run command under the given identity.
    StartRun { run: RunId },
}

/// Where the engine currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing pending, no run process expected to need replacing.
    Idle,
    /// A debounce window is armed; a rebuild will follow when it fires.
    Debouncing,
    /// The build command is executing (the shell blocks on it).
    Building,
    /// The run command is alive.
    Running,
    /// The run process exited; waiting out the restart delay.
    RestartCooldown,
}

/// Result of one core step.
#[derive(Debug)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

impl CoreStep {
    fn noop() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// The slice of settings the core needs.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub has_build: bool,
    pub has_run: bool,
    pub debounce_delay: Duration,
    pub restart_delay: Duration,
}

/// The engine core.
///
/// Owns the supervisor-visible state: the current run-process identity, the
/// interrupt latch, and the current debounce window. All of it is mutated
/// only inside [`EngineCore::step`].
#[derive(Debug)]
pub struct EngineCore {
    config: CoreConfig,
    phase: Phase,
    current_run: Option<RunId>,
    interrupt_sent: bool,
    window: Option<WindowId>,
    next_window: WindowId,
    next_run: RunId,
}

impl EngineCore {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            current_run: None,
            interrupt_sent: false,
            window: None,
            next_window: 0,
            next_run: 0,
        }
    }

    /// Commands to execute before the first event is consumed.
    ///
    /// The first build+run cycle starts immediately at launch, without
    /// waiting for a change: the initial window is armed with a zero delay.
    pub fn startup(&mut self) -> Vec<CoreCommand> {
        self.phase = Phase::Debouncing;
        vec![self.arm_window(Duration::ZERO)]
    }

    /// Current phase (exposed for tests).
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Identity of the live run process, if any (exposed for tests).
    pub fn current_run(&self) -> Option<RunId> {
        self.current_run
    }

    /// Whether the live run process has already been sent an interrupt
    /// (exposed for tests).
    pub fn interrupt_sent(&self) -> bool {
        self.interrupt_sent
    }

    /// Handle a single event, updating state and returning the commands for
    /// the IO shell.
    pub fn step(&mut self, event: EngineEvent) -> CoreStep {
        match event {
            EngineEvent::PathChanged { .. } => self.on_change(),
            EngineEvent::DelayElapsed { window } => self.on_window_fire(window),
            EngineEvent::BuildFinished { outcome } => self.on_build_finished(outcome),
            EngineEvent::RunExited { run, .. } => self.on_run_exited(run),
            EngineEvent::ShutdownRequested => self.on_shutdown(),
            // Fatal; the shell aborts before stepping the core. Stop anyway
            // if one slips through.
            EngineEvent::WatchFailed { .. } => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    /// A relevant change arms (or re-arms) the debounce window. If a run
    /// process is alive and has not been asked to stop yet, the graceful
    /// interrupt goes out now so its shutdown overlaps the debounce delay.
    fn on_change(&mut self) -> CoreStep {
        let mut commands = vec![self.arm_window(self.config.debounce_delay)];
        self.phase = Phase::Debouncing;

        if let Some(run) = self.current_run {
            if !self.interrupt_sent {
                self.interrupt_sent = true;
                commands.push(CoreCommand::InterruptRun { run });
            }
        }

        CoreStep::with(commands)
    }

    /// The debounce window elapsed: kill whatever run process is left and
    /// start a fresh cycle. Stale windows (superseded by a later change or
    /// by the restart cooldown) are ignored.
    fn on_window_fire(&mut self, window: WindowId) -> CoreStep {
        if self.window != Some(window) {
            debug!(window, "elapsed window is superseded; ignoring");
            return CoreStep::noop();
        }
        self.window = None;

        let mut commands = Vec::new();
        if let Some(run) = self.current_run.take() {
            commands.push(CoreCommand::KillRun { run });
            self.interrupt_sent = false;
        }

        if self.config.has_build {
            commands.push(CoreCommand::RunBuild);
            self.phase = Phase::Building;
        } else if self.config.has_run {
            commands.push(self.start_run());
        } else {
            // Unreachable after config validation.
            self.phase = Phase::Idle;
        }

        CoreStep::with(commands)
    }

    /// A failed build suppresses the run step for this cycle; the next
    /// relevant change retries from scratch.
    fn on_build_finished(&mut self, outcome: BuildOutcome) -> CoreStep {
        match outcome {
            BuildOutcome::Success if self.config.has_run => {
                CoreStep::with(vec![self.start_run()])
            }
            BuildOutcome::Success => {
                self.phase = Phase::Idle;
                CoreStep::noop()
            }
            BuildOutcome::Failed(_) => {
                self.phase = Phase::Idle;
                CoreStep::noop()
            }
        }
    }

    /// The run process exited on its own; crash or normal exit, the engine
    /// restarts either way. Exit events for superseded process instances
    /// are discarded.
    fn on_run_exited(&mut self, run: RunId) -> CoreStep {
        if self.current_run != Some(run) {
            debug!(run, "exit event for superseded run process; ignoring");
            return CoreStep::noop();
        }
        self.current_run = None;
        self.interrupt_sent = false;
        self.phase = Phase::RestartCooldown;

        CoreStep::with(vec![self.arm_window(self.config.restart_delay)])
    }

    fn on_shutdown(&mut self) -> CoreStep {
        let mut commands = Vec::new();
        if let Some(run) = self.current_run.take() {
            commands.push(CoreCommand::KillRun { run });
        }
        self.window = None;
        CoreStep {
            commands,
            keep_running: false,
        }
    }

    /// Allocate a fresh window, invalidating the previous one by identity.
    fn arm_window(&mut self, delay: Duration) -> CoreCommand {
        let window = self.next_window;
        self.next_window += 1;
        self.window = Some(window);
        CoreCommand::ArmWindow { window, delay }
    }

    /// Allocate a fresh run identity and transition to `Running`.
    fn start_run(&mut self) -> CoreCommand {
        let run = self.next_run;
        self.next_run += 1;
        self.current_run = Some(run);
        self.interrupt_sent = false;
        self.phase = Phase::Running;
        CoreCommand::StartRun { run }
    }
}
