// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::errors::{Result, WatchrunError};
use crate::exec::ProcessBackend;

use super::core::{BuildOutcome, CoreCommand, EngineCore, EngineEvent};
use super::debounce::DebounceTimer;

/// Drives the engine core in response to `EngineEvent`s and delegates
/// process work to a `ProcessBackend`.
///
/// This is a pure IO shell around [`EngineCore`], which contains all the
/// engine semantics. The shell reads events from the inbox, arms the
/// debounce timer, and runs builds. A build blocks the loop for its full
/// duration, so a build in flight always finishes before the engine acts on
/// anything else.
pub struct Runtime<B: ProcessBackend> {
    core: EngineCore,
    events_rx: mpsc::Receiver<EngineEvent>,
    timer: DebounceTimer,
    backend: B,
    build_cmd: Vec<String>,
    run_cmd: Vec<String>,
}

impl<B: ProcessBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> Runtime<B> {
    pub fn new(
        core: EngineCore,
        settings: &Settings,
        events_rx: mpsc::Receiver<EngineEvent>,
        timer: DebounceTimer,
        backend: B,
    ) -> Self {
        Self {
            core,
            events_rx,
            timer,
            backend,
            build_cmd: settings.build_cmd.clone(),
            run_cmd: settings.run_cmd.clone(),
        }
    }

    /// Main event loop.
    ///
    /// Returns when shutdown is requested or the inbox closes; returns an
    /// error on fatal conditions (watch-source failure, spawn failure).
    pub async fn run(mut self) -> Result<()> {
        info!("watchrun engine started");

        let startup = self.core.startup();
        self.execute(startup).await?;

        loop {
            let event = match self.events_rx.recv().await {
                Some(event) => event,
                None => {
                    info!("engine inbox closed; exiting");
                    break;
                }
            };

            debug!(?event, "engine received event");

            match &event {
                EngineEvent::WatchFailed { message } => {
                    return Err(WatchrunError::WatchSource(message.clone()));
                }
                EngineEvent::PathChanged { path } => {
                    info!(path = %path.display(), "changed");
                }
                _ => {}
            }

            let step = self.core.step(event);
            self.execute(step.commands).await?;

            if !step.keep_running {
                break;
            }
        }

        info!("watchrun engine exiting");
        Ok(())
    }

    /// Execute commands from the core.
    ///
    /// A build's outcome is fed straight back into the core, so commands can
    /// cascade; they are processed as a queue.
    async fn execute(&mut self, commands: Vec<CoreCommand>) -> Result<()> {
        let mut queue: VecDeque<CoreCommand> = commands.into();

        while let Some(command) = queue.pop_front() {
            match command {
                CoreCommand::ArmWindow { window, delay } => {
                    debug!(window, ?delay, "arming debounce window");
                    self.timer.arm(window, delay);
                }
                CoreCommand::InterruptRun { run } => {
                    info!(run, "interrupting run process");
                    self.backend.interrupt_run(run);
                }
                CoreCommand::KillRun { run } => {
                    info!(run, "killing old process");
                    self.backend.kill_run(run);
                }
                CoreCommand::RunBuild => {
                    info!(cmd = %self.build_cmd.join(" "), "building...");
                    let outcome = self.backend.run_build(self.build_cmd.clone()).await?;
                    if let BuildOutcome::Failed(code) = outcome {
                        warn!(exit_code = code, "build failed; run step skipped");
                    }
                    let step = self.core.step(EngineEvent::BuildFinished { outcome });
                    queue.extend(step.commands);
                }
                CoreCommand::StartRun { run } => {
                    info!(run, cmd = %self.run_cmd.join(" "), "running...");
                    self.backend.start_run(self.run_cmd.clone(), run).await?;
                }
            }
        }

        Ok(())
    }
}
