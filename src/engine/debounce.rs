// src/engine/debounce.rs

//! Cancellable debounce timer.
//!
//! One scheduled task at a time: arming cancels the outstanding task and
//! schedules a new one, so a burst of changes produces a single elapsed
//! notification. The core additionally checks window identity, so even a
//! task that fires in the gap between cancellation and re-arming is
//! harmless.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::engine::core::{EngineEvent, WindowId};

/// Shell-side half of the debounce window.
#[derive(Debug)]
pub struct DebounceTimer {
    events_tx: mpsc::Sender<EngineEvent>,
    task: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn new(events_tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            events_tx,
            task: None,
        }
    }

    /// Cancel any outstanding window and schedule a new one.
    ///
    /// When the delay elapses without the task having been superseded, a
    /// single [`EngineEvent::DelayElapsed`] is posted to the inbox.
    pub fn arm(&mut self, window: WindowId, delay: Duration) {
        if let Some(task) = self.task.take() {
            task.abort();
        }

        let tx = self.events_tx.clone();
        self.task = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            // Inbox closed means the engine is shutting down; drop silently.
            let _ = tx.send(EngineEvent::DelayElapsed { window }).await;
        }));
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        // A window must not fire after the engine is gone.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    fn inbox() -> (DebounceTimer, mpsc::Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel(16);
        (DebounceTimer::new(tx), rx)
    }

    async fn recv_window(rx: &mut mpsc::Receiver<EngineEvent>) -> WindowId {
        match rx.recv().await {
            Some(EngineEvent::DelayElapsed { window }) => window,
            other => panic!("expected DelayElapsed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (mut timer, mut rx) = inbox();
        timer.arm(7, Duration::from_millis(100));
        tokio::task::yield_now().await;

        advance(Duration::from_millis(100)).await;
        assert_eq!(recv_window(&mut rx).await, 7);

        // No second firing.
        let extra = timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_supersedes_previous_window() {
        let (mut timer, mut rx) = inbox();
        timer.arm(1, Duration::from_millis(100));
        tokio::task::yield_now().await;
        advance(Duration::from_millis(50)).await;
        timer.arm(2, Duration::from_millis(100));
        tokio::task::yield_now().await;

        advance(Duration::from_millis(100)).await;
        assert_eq!(recv_window(&mut rx).await, 2);

        let extra = timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(extra.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_fires_immediately() {
        let (mut timer, mut rx) = inbox();
        timer.arm(0, Duration::ZERO);
        assert_eq!(recv_window(&mut rx).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_timer_never_fires() {
        let (mut timer, mut rx) = inbox();
        timer.arm(3, Duration::from_millis(100));
        tokio::task::yield_now().await;
        drop(timer);

        advance(Duration::from_millis(200)).await;
        // All senders are gone and the task was aborted: the channel closes
        // without ever delivering an elapsed notification.
        assert!(rx.recv().await.is_none());
    }
}
