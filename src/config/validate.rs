// src/config/validate.rs

use crate::config::model::Settings;
use crate::errors::{Result, WatchrunError};

/// Run semantic validation against resolved settings.
///
/// This checks:
/// - there is at least one watch target
/// - at least one of the build and run commands is configured
///
/// A zero debounce delay is allowed; it simply disables coalescing.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    ensure_has_targets(settings)?;
    ensure_has_command(settings)?;
    Ok(())
}

fn ensure_has_targets(settings: &Settings) -> Result<()> {
    if settings.targets.is_empty() {
        return Err(WatchrunError::Config(
            "at least one watch target is required (a glob pattern, or a directory with --tree)"
                .to_string(),
        ));
    }
    Ok(())
}

fn ensure_has_command(settings: &Settings) -> Result<()> {
    if settings.build_cmd.is_empty() && settings.run_cmd.is_empty() {
        return Err(WatchrunError::Config(
            "at least one of --build and --run is required".to_string(),
        ));
    }
    Ok(())
}
