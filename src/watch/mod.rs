// src/watch/mod.rs

//! File watching and change filtering.
//!
//! This module is responsible for:
//! - Compiling watch targets into per-root glob rules (the match filter).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** know about builds or run processes; it only turns
//! filesystem changes into engine events.

pub mod rules;
pub mod watcher;

pub use rules::{build_watch_rules, AddressingMode, WatchRule};
pub use watcher::{spawn_watcher, WatcherHandle};
