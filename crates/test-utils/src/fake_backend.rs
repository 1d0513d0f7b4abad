use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use watchrun::engine::{BuildOutcome, RunId};
use watchrun::errors::Result;
use watchrun::exec::ProcessBackend;

/// Everything a `ProcessBackend` was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAction {
    Build(Vec<String>),
    Start { run: RunId, cmd: Vec<String> },
    Interrupt(RunId),
    Kill(RunId),
}

/// Shared, inspectable action log.
pub type ActionLog = Arc<Mutex<Vec<BackendAction>>>;

/// A fake process backend that:
/// - records every build/start/interrupt/kill request
/// - completes builds immediately with scripted outcomes (default: success)
/// - never spawns real processes; tests inject `RunExited` events themselves.
pub struct FakeBackend {
    actions: ActionLog,
    build_outcomes: VecDeque<BuildOutcome>,
}

impl FakeBackend {
    pub fn new() -> (Self, ActionLog) {
        let actions: ActionLog = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                actions: Arc::clone(&actions),
                build_outcomes: VecDeque::new(),
            },
            actions,
        )
    }

    /// Queue an outcome for a future build; unscripted builds succeed.
    pub fn script_build_outcome(&mut self, outcome: BuildOutcome) {
        self.build_outcomes.push_back(outcome);
    }
}

impl ProcessBackend for FakeBackend {
    fn run_build(
        &mut self,
        cmd: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<BuildOutcome>> + Send + '_>> {
        self.actions.lock().unwrap().push(BackendAction::Build(cmd));
        let outcome = self
            .build_outcomes
            .pop_front()
            .unwrap_or(BuildOutcome::Success);
        Box::pin(async move { Ok(outcome) })
    }

    fn start_run(
        &mut self,
        cmd: Vec<String>,
        run: RunId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.actions
            .lock()
            .unwrap()
            .push(BackendAction::Start { run, cmd });
        Box::pin(async { Ok(()) })
    }

    fn interrupt_run(&mut self, run: RunId) {
        self.actions
            .lock()
            .unwrap()
            .push(BackendAction::Interrupt(run));
    }

    fn kill_run(&mut self, run: RunId) {
        self.actions.lock().unwrap().push(BackendAction::Kill(run));
    }
}
