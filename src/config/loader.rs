// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::cli::CliArgs;
use crate::config::model::{
    parse_duration, tokenize_command, FileConfig, Settings, DEFAULT_CONFIG_PATH,
    DEFAULT_DEBOUNCE_DELAY, DEFAULT_RESTART_DELAY,
};
use crate::errors::Result;
use crate::watch::AddressingMode;

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; semantic validation happens in
/// [`crate::config::validate`] after the CLI has been merged in.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<FileConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {path:?}"))?;

    let config: FileConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Resolve the effective settings from CLI arguments and an optional config
/// file.
///
/// Merge rules:
/// - An explicit `--config` path must exist; otherwise `Watchrun.toml` is
///   loaded if present, and defaults apply if not.
/// - Every CLI flag overrides the corresponding file key.
/// - CLI targets replace the file's `watch` list entirely.
pub fn resolve(args: &CliArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_from_path(default)?
            } else {
                FileConfig::default()
            }
        }
    };

    let build = args.build.clone().or(file.build);
    let run = args.run.clone().or(file.run);

    let debounce_delay = match args.delay.as_deref().or(file.delay.as_deref()) {
        Some(s) => parse_duration(s)?,
        None => DEFAULT_DEBOUNCE_DELAY,
    };
    let restart_delay = match args.restart_delay.as_deref().or(file.restart_delay.as_deref()) {
        Some(s) => parse_duration(s)?,
        None => DEFAULT_RESTART_DELAY,
    };

    let targets = if args.targets.is_empty() {
        file.watch.clone()
    } else {
        args.targets.clone()
    };

    let mode = if args.tree || file.tree.unwrap_or(false) {
        AddressingMode::Tree
    } else {
        AddressingMode::Glob
    };

    Ok(Settings {
        build_cmd: build.as_deref().map(tokenize_command).unwrap_or_default(),
        run_cmd: run.as_deref().map(tokenize_command).unwrap_or_default(),
        debounce_delay,
        restart_delay,
        targets,
        mode,
    })
}
