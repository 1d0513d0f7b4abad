// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, WatchrunError};
use crate::watch::AddressingMode;

/// Debounce delay applied when neither the CLI nor the config file sets one.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_secs(1);

/// Cooldown applied after the run process exits, before rebuilding.
pub const DEFAULT_RESTART_DELAY: Duration = Duration::from_secs(2);

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "Watchrun.toml";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// build = "cargo build"
/// run = "./target/debug/server"
/// delay = "1s"
/// restart_delay = "2s"
/// watch = ["src/*.rs", "templates/**/*.html"]
/// tree = false
/// ```
///
/// All keys are optional; CLI flags take precedence over the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Build command, tokenized on whitespace before execution.
    #[serde(default)]
    pub build: Option<String>,

    /// Run command, tokenized on whitespace before execution.
    #[serde(default)]
    pub run: Option<String>,

    /// Debounce delay as a duration string (e.g. `"500ms"`, `"1s"`).
    #[serde(default)]
    pub delay: Option<String>,

    /// Restart cooldown as a duration string.
    #[serde(default)]
    pub restart_delay: Option<String>,

    /// Watch targets: glob patterns, or directories when `tree = true`.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Whether targets are whole directory trees instead of glob patterns.
    #[serde(default)]
    pub tree: Option<bool>,
}

/// Fully resolved settings the engine runs with.
///
/// Produced by [`crate::config::loader::resolve`] from CLI arguments merged
/// over an optional config file. An empty command list means "no such step".
#[derive(Debug, Clone)]
pub struct Settings {
    pub build_cmd: Vec<String>,
    pub run_cmd: Vec<String>,
    pub debounce_delay: Duration,
    pub restart_delay: Duration,
    pub targets: Vec<String>,
    pub mode: AddressingMode,
}

/// Split a command string into an argument list.
///
/// TODO: respect quoted arguments when splitting command strings.
pub fn tokenize_command(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Parse a duration string like `"250ms"`, `"3s"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(WatchrunError::InvalidDuration {
            input: s.to_string(),
            reason: "empty duration string".to_string(),
        });
    }

    // Find the boundary between digits and suffix.
    let idx = trimmed
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| WatchrunError::InvalidDuration {
            input: s.to_string(),
            reason: "missing unit suffix (ms, s, m, or h)".to_string(),
        })?;

    let (num_part, unit_part) = trimmed.split_at(idx);
    let value: u64 = num_part.parse().map_err(|e| WatchrunError::InvalidDuration {
        input: s.to_string(),
        reason: format!("invalid number '{num_part}': {e}"),
    })?;

    match unit_part.trim().to_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        other => Err(WatchrunError::InvalidDuration {
            input: s.to_string(),
            reason: format!("unsupported unit '{other}'; expected ms, s, m, or h"),
        }),
    }
}
