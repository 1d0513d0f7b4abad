// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod watch;

use tokio::sync::mpsc;

use crate::cli::CliArgs;
use crate::config::Settings;
use crate::engine::{CoreConfig, DebounceTimer, EngineCore, EngineEvent, Runtime};
use crate::errors::Result;
use crate::exec::ProcessSupervisor;
use crate::watch::WatchRule;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - configuration (CLI merged over an optional TOML file)
/// - watch rules and the file watcher
/// - the process supervisor
/// - the engine core and its IO shell
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = config::resolve(&args)?;
    config::validate_settings(&settings)?;

    let rules = watch::build_watch_rules(&settings.targets, settings.mode)?;

    if args.dry_run {
        print_dry_run(&settings, &rules);
        return Ok(());
    }

    // Engine inbox: every concurrent producer only posts events here.
    let (events_tx, events_rx) = mpsc::channel::<EngineEvent>(64);

    let _watcher_handle = watch::spawn_watcher(rules, events_tx.clone())?;

    // Ctrl-C → clean shutdown of the run process, then exit.
    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(EngineEvent::ShutdownRequested).await;
        });
    }

    let core = EngineCore::new(CoreConfig {
        has_build: !settings.build_cmd.is_empty(),
        has_run: !settings.run_cmd.is_empty(),
        debounce_delay: settings.debounce_delay,
        restart_delay: settings.restart_delay,
    });
    let timer = DebounceTimer::new(events_tx.clone());
    let backend = ProcessSupervisor::new(events_tx);

    let runtime = Runtime::new(core, &settings, events_rx, timer, backend);
    runtime.run().await
}

/// Simple dry-run output: print resolved settings and watch rules.
fn print_dry_run(settings: &Settings, rules: &[WatchRule]) {
    println!("watchrun dry-run");
    println!("  build: {}", format_cmd(&settings.build_cmd));
    println!("  run: {}", format_cmd(&settings.run_cmd));
    println!("  delay: {:?}", settings.debounce_delay);
    println!("  restart delay: {:?}", settings.restart_delay);
    println!();

    for rule in rules {
        println!("watching {}:", rule.root().display());
        for pattern in rule.patterns() {
            println!("    {pattern}");
        }
    }
}

fn format_cmd(cmd: &[String]) -> String {
    if cmd.is_empty() {
        "(none)".to_string()
    } else {
        cmd.join(" ")
    }
}
