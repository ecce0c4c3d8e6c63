//! Live stopwatch capture with display tickers.
//!
//! Wraps a [`Stopwatch`] and keeps two [`watch`] channels current: the wall
//! clock (refreshed every [`WALL_TICK`] for the whole capture lifetime) and
//! the elapsed time (refreshed every [`ELAPSED_TICK`], only while running).
//! The elapsed ticker is aborted whenever the stopwatch leaves `Running`, and
//! each transition publishes the exact elapsed value so a paused display
//! shows the frozen time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::clock::{MonotonicClock, WallClock};
use crate::record::TimeRecord;
use crate::stopwatch::{Stopwatch, StopwatchCommand, StopwatchStatus};
use crate::ticker::{ELAPSED_TICK, Ticker, WALL_TICK};
use crate::types::RecordId;

pub struct StopwatchCapture<M: MonotonicClock, W: WallClock> {
    stopwatch: Stopwatch<M, W>,
    monotonic: M,
    elapsed_tx: Arc<watch::Sender<Duration>>,
    wall_tx: Arc<watch::Sender<i64>>,
    _wall_ticker: Ticker,
    elapsed_ticker: Option<Ticker>,
}

impl<M: MonotonicClock, W: WallClock> StopwatchCapture<M, W> {
    /// Creates an idle capture. Must be called from within a Tokio runtime.
    pub fn new(monotonic: M, wall: W) -> Self {
        let (elapsed_tx, _) = watch::channel(Duration::ZERO);
        let (wall_tx, _) = watch::channel(wall.now_millis());
        let wall_tx = Arc::new(wall_tx);

        let wall_ticker = {
            let wall_tx = Arc::clone(&wall_tx);
            let wall = wall.clone();
            Ticker::spawn(WALL_TICK, move || {
                wall_tx.send_replace(wall.now_millis());
            })
        };

        Self {
            stopwatch: Stopwatch::new(monotonic.clone(), wall),
            monotonic,
            elapsed_tx: Arc::new(elapsed_tx),
            wall_tx,
            _wall_ticker: wall_ticker,
            elapsed_ticker: None,
        }
    }

    pub fn subscribe_elapsed(&self) -> watch::Receiver<Duration> {
        self.elapsed_tx.subscribe()
    }

    pub fn subscribe_wall(&self) -> watch::Receiver<i64> {
        self.wall_tx.subscribe()
    }

    pub const fn stopwatch(&self) -> &Stopwatch<M, W> {
        &self.stopwatch
    }

    pub const fn status(&self) -> StopwatchStatus {
        self.stopwatch.status()
    }

    pub const fn is_elapsed_ticking(&self) -> bool {
        self.elapsed_ticker.is_some()
    }

    pub fn apply(&mut self, command: StopwatchCommand) -> bool {
        if !self.stopwatch.apply(command) {
            return false;
        }
        self.elapsed_tx.send_replace(self.stopwatch.elapsed());
        self.sync_elapsed_ticker();
        true
    }

    pub fn start(&mut self) -> bool {
        self.apply(StopwatchCommand::Start)
    }

    pub fn pause(&mut self) -> bool {
        self.apply(StopwatchCommand::Pause)
    }

    pub fn resume(&mut self) -> bool {
        self.apply(StopwatchCommand::Resume)
    }

    pub fn stop(&mut self) -> bool {
        self.apply(StopwatchCommand::Stop)
    }

    pub fn reset(&mut self) -> bool {
        self.apply(StopwatchCommand::Reset)
    }

    pub fn add_mark(&mut self, note: impl Into<String>) -> Option<&TimeRecord> {
        self.stopwatch.add_mark(note)
    }

    pub fn delete_mark_at(&mut self, index: u32) -> Option<TimeRecord> {
        self.stopwatch.delete_mark_at(index)
    }

    pub fn set_note(&mut self, id: &RecordId, note: impl Into<String>) -> bool {
        self.stopwatch.set_note(id, note)
    }

    fn sync_elapsed_ticker(&mut self) {
        match self.stopwatch.running_anchor() {
            Some(anchor) => {
                let elapsed_tx = Arc::clone(&self.elapsed_tx);
                let monotonic = self.monotonic.clone();
                self.elapsed_ticker = Some(Ticker::spawn(ELAPSED_TICK, move || {
                    elapsed_tx.send_replace(anchor.elapsed_at(monotonic.now()));
                }));
            }
            None => {
                if let Some(ticker) = self.elapsed_ticker.take() {
                    ticker.cancel();
                }
            }
        }
    }
}
