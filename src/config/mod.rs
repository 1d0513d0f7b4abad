// src/config/mod.rs

//! Configuration layer.
//!
//! Settings come from two places: CLI flags and an optional TOML file
//! (`Watchrun.toml`). [`loader::resolve`] merges them (CLI wins) into a
//! single [`Settings`] value; [`validate::validate_settings`] rejects
//! configurations the engine cannot run with.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, resolve};
pub use model::{
    parse_duration, tokenize_command, FileConfig, Settings, DEFAULT_CONFIG_PATH,
    DEFAULT_DEBOUNCE_DELAY, DEFAULT_RESTART_DELAY,
};
pub use validate::validate_settings;
