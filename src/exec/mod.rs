// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the build and run
//! commands, using `tokio::process::Command`, and reporting run-process
//! exits back to the orchestration runtime via `EngineEvent`s.
//!
//! - [`backend`] provides the `ProcessBackend` trait the runtime talks to,
//!   which tests can replace with a fake implementation.
//! - [`supervisor`] is the production implementation owning the single run
//!   process and its graceful-then-forceful shutdown.

pub mod backend;
pub mod supervisor;

pub use backend::ProcessBackend;
pub use supervisor::ProcessSupervisor;
