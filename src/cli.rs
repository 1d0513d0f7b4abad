// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Watch files and re-run a build and a long-lived command on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Glob patterns to watch, or directories when --tree is given.
    ///
    /// Patterns are matched against the full absolute path of a changed
    /// file, e.g. `src/*.rs` or `templates/**/*.html`.
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Build command. Runs to completion before the run step and is never
    /// interrupted by new changes.
    #[arg(long, value_name = "CMD")]
    pub build: Option<String>,

    /// Run command. Started only if the build succeeds; killed and
    /// restarted on the next change.
    #[arg(long, value_name = "CMD")]
    pub run: Option<String>,

    /// Delay after a change before rebuilding (e.g. "500ms", "1s").
    #[arg(long, value_name = "DURATION")]
    pub delay: Option<String>,

    /// Delay after the run command exits or crashes before rebuilding.
    #[arg(long = "restart-delay", value_name = "DURATION")]
    pub restart_delay: Option<String>,

    /// Treat targets as directories and watch everything under them.
    #[arg(long)]
    pub tree: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `Watchrun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve configuration and watch rules, print them, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
