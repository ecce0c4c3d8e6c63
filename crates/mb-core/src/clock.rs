//! Clock sources.
//!
//! Elapsed time and wall-clock time come from two separate traits even though
//! the operating system exposes both through one API. Elapsed durations are
//! only ever computed from [`MonotonicClock`] readings, so adjusting the
//! system time cannot make a running stopwatch jump. [`WallClock`] readings
//! are used for display and for assigning records to a logical day.
//!
//! The `Manual*` clocks are driven by hand. Clones share the same reading,
//! which lets a test hold one handle while the stopwatch or a ticker holds
//! another.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;

/// A monotonic time source.
pub trait MonotonicClock: Clone + Send + Sync + 'static {
    /// Time since an arbitrary, fixed origin. Never decreases.
    fn now(&self) -> Duration;
}

/// A wall-clock time source.
pub trait WallClock: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemMonotonicClock {
    origin: Instant,
}

impl SystemMonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemMonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemMonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hand-driven monotonic clock.
#[derive(Debug, Clone, Default)]
pub struct ManualMonotonicClock {
    nanos: Arc<AtomicU64>,
}

impl ManualMonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(by, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualMonotonicClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Hand-driven wall clock. Unlike the monotonic one it can be set backwards.
#[derive(Debug, Clone, Default)]
pub struct ManualWallClock {
    millis: Arc<AtomicI64>,
}

impl ManualWallClock {
    pub fn at(millis: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(millis)),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(by, Ordering::SeqCst);
    }
}

impl WallClock for ManualWallClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}
