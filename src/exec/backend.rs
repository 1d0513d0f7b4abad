// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The runtime talks to a `ProcessBackend` instead of spawning processes
//! itself. This keeps the production supervisor implementation in
//! [`crate::exec::supervisor`] and makes it easy to swap in a fake backend
//! in tests.
//!
//! - [`crate::exec::supervisor::ProcessSupervisor`] is the implementation
//!   used by `watchrun`.
//! - Tests can provide their own `ProcessBackend` that records commands and
//!   never touches real processes.

use std::future::Future;
use std::pin::Pin;

use crate::engine::{BuildOutcome, RunId};
use crate::errors::Result;

/// Trait abstracting how build and run commands are executed.
///
/// Commands are passed as owned, tokenized argument lists; callers guarantee
/// they are non-empty (the core never issues a build or run command for an
/// unconfigured step).
pub trait ProcessBackend: Send {
    /// Run the build command to completion and report its outcome.
    ///
    /// Streams the child's stdout/stderr to the engine's own streams. A
    /// non-zero exit is a normal [`BuildOutcome::Failed`]; failing to spawn
    /// at all is an `Err` and fatal to the engine.
    fn run_build(
        &mut self,
        cmd: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<BuildOutcome>> + Send + '_>>;

    /// Spawn the run command under the given identity.
    ///
    /// The backend arranges for an [`crate::engine::EngineEvent::RunExited`]
    /// tagged with `run` to be posted when the process terminates for any
    /// reason other than an explicit [`ProcessBackend::kill_run`].
    fn start_run(
        &mut self,
        cmd: Vec<String>,
        run: RunId,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Ask the identified run process to stop gracefully. No-op if the
    /// identity does not match the live process or none exists.
    fn interrupt_run(&mut self, run: RunId);

    /// Force-kill the identified run process. Idempotent; does not wait for
    /// the process to die.
    fn kill_run(&mut self, run: RunId);
}
