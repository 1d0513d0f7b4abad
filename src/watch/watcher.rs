// src/watch/watcher.rs

use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::EngineEvent;
use crate::errors::Result;
use crate::watch::rules::WatchRule;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher over the given rules and forward relevant
/// changes into the engine's event inbox.
///
/// Each rule's root is watched recursively; the rule's compiled patterns
/// decide relevance, so unrelated paths under a root never reach the engine.
/// Watch-source errors are forwarded as [`EngineEvent::WatchFailed`], which
/// the engine treats as fatal.
pub fn spawn_watcher(
    rules: Vec<WatchRule>,
    events_tx: mpsc::Sender<EngineEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if raw_tx.send(res).is_err() {
                // Engine is gone; nothing sensible left to do.
                eprintln!("watchrun: failed to forward notify event");
            }
        },
        Config::default(),
    )?;

    for rule in &rules {
        watcher.watch(rule.root(), RecursiveMode::Recursive)?;
        info!(
            root = %rule.root().display(),
            patterns = ?rule.patterns(),
            "watching"
        );
    }

    let rules = Arc::new(rules);
    tokio::spawn(async move {
        while let Some(res) = raw_rx.recv().await {
            match res {
                Ok(event) => {
                    if !is_change_kind(&event.kind) {
                        continue;
                    }
                    for path in &event.paths {
                        if !rules.iter().any(|rule| rule.matches(path)) {
                            continue;
                        }
                        if events_tx
                            .send(EngineEvent::PathChanged { path: path.clone() })
                            .await
                            .is_err()
                        {
                            // Engine inbox closed; stop forwarding.
                            return;
                        }
                    }
                }
                Err(err) => {
                    let _ = events_tx
                        .send(EngineEvent::WatchFailed {
                            message: err.to_string(),
                        })
                        .await;
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Creations, modifications, removals and renames count as changes;
/// access-only notifications do not.
fn is_change_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
