//! Progress reporting for crack and extraction runs.
//!
//! The library never prints. Long-running stages hand snapshots to an
//! optional callback and the front end decides how to render them.

use std::sync::Arc;
use std::time::Duration;

/// Snapshot emitted after each dictionary attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CrackProgress {
    /// 1-based position of `candidate` in the dictionary.
    pub index: usize,
    pub total: usize,
    pub percent: f32,
    pub candidate: String,
    pub elapsed: Duration,
}

impl CrackProgress {
    /// Attempts per second so far.
    pub fn rate(&self) -> f32 {
        let secs = self.elapsed.as_secs_f32();
        if secs > 0.0 {
            self.index as f32 / secs
        } else {
            0.0
        }
    }
}

/// Crack progress callback function type
pub type CrackProgressCallback = dyn Fn(CrackProgress) + Send + Sync;

/// Extraction ticker callback: receives the elapsed time once per tick.
pub type TickCallback = dyn Fn(Duration) + Send + Sync;

/// Spawns the extraction ticker.
///
/// The task calls `on_tick` every `interval` until the returned [`Ticker`] is
/// stopped or dropped, so every exit path of the caller ends it.
pub fn start_ticker(interval: Duration, on_tick: Arc<TickCallback>) -> Ticker {
    let (done_tx, mut done_rx) = tokio::sync::oneshot::channel::<()>();
    let start = tokio::time::Instant::now();
    let handle = tokio::spawn(async move {
        let mut ticks = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = &mut done_rx => break,
                _ = ticks.tick() => on_tick(start.elapsed()),
            }
        }
    });
    Ticker {
        done: Some(done_tx),
        handle: Some(handle),
    }
}

/// Handle on a running ticker.
pub struct Ticker {
    done: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Ticker {
    /// Signals the ticker and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
