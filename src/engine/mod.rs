// src/engine/mod.rs

//! Orchestration engine for watchrun.
//!
//! This module ties together:
//! - the debounce timer (coalescing bursts of changes into one trigger)
//! - the main event loop that reacts to:
//!   - relevant file changes
//!   - elapsed debounce windows
//!   - build completions
//!   - run-process exits
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

pub mod core;
pub mod debounce;
pub mod runtime;

pub use self::core::{
    BuildOutcome, CoreCommand, CoreConfig, CoreStep, EngineCore, EngineEvent, Phase, RunId,
    WindowId,
};
pub use self::debounce::DebounceTimer;
pub use self::runtime::Runtime;
