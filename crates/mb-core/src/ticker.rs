//! Periodic display tickers.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Wall-clock display refresh.
pub const WALL_TICK: Duration = Duration::from_secs(1);

/// Elapsed-time display refresh while a stopwatch runs.
pub const ELAPSED_TICK: Duration = Duration::from_millis(10);

/// A spawned task calling `on_tick` every period until cancelled.
///
/// Dropping the ticker aborts the task, so a ticker can never outlive the
/// value that owns it.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawns the ticker on the current Tokio runtime.
    ///
    /// The first tick fires as soon as the task is first polled.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                on_tick();
            }
        });
        Self { handle }
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
