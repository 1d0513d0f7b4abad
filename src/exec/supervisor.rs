// src/exec/supervisor.rs

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{BuildOutcome, EngineEvent, RunId};
use crate::errors::{Result, WatchrunError};
use crate::exec::backend::ProcessBackend;

/// The live run process, as seen by the supervisor.
///
/// The child itself is owned by its exit-waiter task; the supervisor keeps
/// only what it needs to signal it: the pid for a graceful interrupt and a
/// one-shot channel for the forceful kill.
struct RunProcess {
    run: RunId,
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<()>>,
}

/// Production process backend.
///
/// Owns the lifecycle of at most one run process at a time. Builds are
/// executed inline (the caller awaits them); the run process is spawned
/// with an exit-waiter task that posts [`EngineEvent::RunExited`] back into
/// the engine inbox. An explicitly killed process posts nothing, and any
/// exit event already in flight is discarded by the core's identity check.
pub struct ProcessSupervisor {
    events_tx: mpsc::Sender<EngineEvent>,
    current: Option<RunProcess>,
}

impl ProcessSupervisor {
    pub fn new(events_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            events_tx,
            current: None,
        }
    }
}

impl ProcessBackend for ProcessSupervisor {
    fn run_build(
        &mut self,
        cmd: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<BuildOutcome>> + Send + '_>> {
        Box::pin(async move {
            let status = command(&cmd)
                .status()
                .await
                .map_err(|source| WatchrunError::Spawn {
                    cmd: cmd.join(" "),
                    source,
                })?;

            let code = status.code().unwrap_or(-1);
            if status.success() {
                Ok(BuildOutcome::Success)
            } else {
                Ok(BuildOutcome::Failed(code))
            }
        })
    }

    fn start_run(
        &mut self,
        cmd: Vec<String>,
        run: RunId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let child = command(&cmd)
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| WatchrunError::Spawn {
                    cmd: cmd.join(" "),
                    source,
                })?;

            let pid = child.id();
            let (kill_tx, kill_rx) = oneshot::channel();

            tokio::spawn(wait_for_exit(child, run, kill_rx, self.events_tx.clone()));

            self.current = Some(RunProcess {
                run,
                pid,
                kill_tx: Some(kill_tx),
            });
            Ok(())
        })
    }

    fn interrupt_run(&mut self, run: RunId) {
        let Some(current) = self.current.as_ref() else {
            return;
        };
        if current.run != run {
            return;
        }

        if let Some(pid) = current.pid {
            if send_interrupt(pid) {
                return;
            }
        }

        // No pid, or a platform without interrupt signals: fall back to the
        // forceful kill.
        self.kill_run(run);
    }

    fn kill_run(&mut self, run: RunId) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        if current.run != run {
            return;
        }
        if let Some(kill_tx) = current.kill_tx.take() {
            let _ = kill_tx.send(());
        }
        self.current = None;
    }
}

/// Build a `Command` for a tokenized argument list, forwarding the child's
/// output streams verbatim.
fn command(argv: &[String]) -> Command {
    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..])
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd
}

/// Wait for the run process to terminate, or kill it on request.
///
/// A process that exits on its own reports [`EngineEvent::RunExited`]; a
/// process killed via the kill channel reports nothing, so the engine never
/// confuses a replaced process's death with a crash of the current one.
async fn wait_for_exit(
    mut child: Child,
    run: RunId,
    kill_rx: oneshot::Receiver<()>,
    events_tx: mpsc::Sender<EngineEvent>,
) {
    tokio::select! {
        status = child.wait() => {
            let code = match status {
                Ok(status) => {
                    if status.success() {
                        info!(run, "run process exited cleanly");
                    } else {
                        warn!(run, code = ?status.code(), "run process exited");
                    }
                    status.code()
                }
                Err(err) => {
                    warn!(run, error = %err, "failed to wait for run process");
                    None
                }
            };
            let _ = events_tx.send(EngineEvent::RunExited { run, code }).await;
        }

        res = kill_rx => {
            match res {
                Ok(()) => {
                    debug!(run, "kill requested for run process");
                    if let Err(err) = child.kill().await {
                        warn!(run, error = %err, "failed to kill run process");
                    }
                    // Killed on request: the engine has already moved on, so
                    // no exit event is reported for this instance.
                }
                Err(_) => {
                    debug!(run, "kill channel closed; dropping run process");
                    // Child is killed on drop via kill_on_drop(true).
                }
            }
        }
    }
}

/// Send SIGINT to the run process. Returns true if the graceful path was
/// taken; a process that is already gone still counts (its exit event is on
/// the way).
#[cfg(unix)]
fn send_interrupt(pid: u32) -> bool {
    // SAFETY: plain syscall on a pid we spawned; if the process is already
    // gone, kill(2) fails with ESRCH and we only log it.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) };
    if rc != 0 {
        warn!(pid, "failed to deliver SIGINT");
    } else {
        debug!(pid, "SIGINT delivered");
    }
    true
}

/// Interrupt signals are not portable off Unix; report failure so the
/// caller escalates to a kill.
#[cfg(not(unix))]
fn send_interrupt(_pid: u32) -> bool {
    false
}
