//! Stopwatch state machine.
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --stop--> Stopped --reset--> Idle
//!                    ^                  |
//!                    +-----resume-------+
//! ```
//!
//! Stopping requires a pause first. Commands issued from a state that does
//! not accept them are ignored.
//!
//! Elapsed time is `(now - start) - total_paused`, all read from the
//! [`MonotonicClock`]. Wall-clock readings are taken separately for mark
//! timestamps and the run's start and end times.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::{MonotonicClock, WallClock};
use crate::record::{MarkList, SplitBasis, TimeRecord};
use crate::types::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopwatchStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

impl StopwatchStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for StopwatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopwatchCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
}

/// The transition table. `None` means the command is ignored in `status`.
pub const fn transition(
    status: StopwatchStatus,
    command: StopwatchCommand,
) -> Option<StopwatchStatus> {
    use StopwatchCommand as C;
    use StopwatchStatus as S;

    match (status, command) {
        (S::Idle, C::Start) | (S::Paused, C::Resume) => Some(S::Running),
        (S::Running, C::Pause) => Some(S::Paused),
        (S::Paused, C::Stop) => Some(S::Stopped),
        (S::Stopped, C::Reset) => Some(S::Idle),
        _ => None,
    }
}

/// Monotonic anchor of a running stopwatch.
///
/// Lets a ticker compute the live elapsed time without borrowing the
/// stopwatch itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningAnchor {
    started_at: Duration,
    total_paused: Duration,
}

impl RunningAnchor {
    pub const fn elapsed_at(&self, now: Duration) -> Duration {
        now.saturating_sub(self.started_at)
            .saturating_sub(self.total_paused)
    }
}

/// A stopped run, ready for archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRun {
    pub start_wall_millis: i64,
    pub end_wall_millis: i64,
    pub total_elapsed_nanos: i64,
    /// Marks oldest first.
    pub records: Vec<TimeRecord>,
}

#[derive(Debug, Clone)]
pub struct Stopwatch<M: MonotonicClock, W: WallClock> {
    monotonic: M,
    wall: W,
    status: StopwatchStatus,
    started_at: Duration,
    paused_at: Duration,
    total_paused: Duration,
    start_wall_millis: Option<i64>,
    end_wall_millis: Option<i64>,
    marks: MarkList,
}

impl<M: MonotonicClock, W: WallClock> Stopwatch<M, W> {
    pub const fn new(monotonic: M, wall: W) -> Self {
        Self {
            monotonic,
            wall,
            status: StopwatchStatus::Idle,
            started_at: Duration::ZERO,
            paused_at: Duration::ZERO,
            total_paused: Duration::ZERO,
            start_wall_millis: None,
            end_wall_millis: None,
            marks: MarkList::new(SplitBasis::Elapsed),
        }
    }

    pub const fn status(&self) -> StopwatchStatus {
        self.status
    }

    /// Applies a command. Returns `false` if the current state ignores it.
    pub fn apply(&mut self, command: StopwatchCommand) -> bool {
        let Some(next) = transition(self.status, command) else {
            tracing::debug!(status = %self.status, ?command, "stopwatch command ignored");
            return false;
        };

        let now = self.monotonic.now();
        match command {
            StopwatchCommand::Start => {
                self.started_at = now;
                self.total_paused = Duration::ZERO;
                self.start_wall_millis = Some(self.wall.now_millis());
                self.end_wall_millis = None;
            }
            StopwatchCommand::Pause => self.paused_at = now,
            StopwatchCommand::Resume => {
                self.total_paused += now.saturating_sub(self.paused_at);
            }
            StopwatchCommand::Stop => self.end_wall_millis = Some(self.wall.now_millis()),
            StopwatchCommand::Reset => self.clear(),
        }

        tracing::debug!(from = %self.status, to = %next, "stopwatch transition");
        self.status = next;
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

    /// Current elapsed time. Frozen while paused or stopped, zero when idle.
    pub fn elapsed(&self) -> Duration {
        match self.status {
            StopwatchStatus::Idle => Duration::ZERO,
            StopwatchStatus::Running => self.anchor().elapsed_at(self.monotonic.now()),
            StopwatchStatus::Paused | StopwatchStatus::Stopped => {
                self.anchor().elapsed_at(self.paused_at)
            }
        }
    }

    pub fn elapsed_nanos(&self) -> i64 {
        duration_nanos(self.elapsed())
    }

    /// Anchor for computing elapsed time outside the stopwatch; only while running.
    pub fn running_anchor(&self) -> Option<RunningAnchor> {
        (self.status == StopwatchStatus::Running).then(|| self.anchor())
    }

    /// Records a mark. Only accepted while running.
    pub fn add_mark(&mut self, note: impl Into<String>) -> Option<&TimeRecord> {
        if self.status != StopwatchStatus::Running {
            tracing::debug!(status = %self.status, "mark ignored");
            return None;
        }
        let elapsed = self.elapsed_nanos();
        let wall = self.wall.now_millis();
        Some(self.marks.push(wall, elapsed, note.into()))
    }

    pub const fn marks(&self) -> &MarkList {
        &self.marks
    }

    pub fn delete_mark(&mut self, id: &RecordId) -> Option<TimeRecord> {
        self.marks.remove(id)
    }

    pub fn delete_mark_at(&mut self, index: u32) -> Option<TimeRecord> {
        self.marks.remove_index(index)
    }

    pub fn set_note(&mut self, id: &RecordId, note: impl Into<String>) -> bool {
        self.marks.set_note(id, note)
    }

    pub const fn start_wall_millis(&self) -> Option<i64> {
        self.start_wall_millis
    }

    pub const fn end_wall_millis(&self) -> Option<i64> {
        self.end_wall_millis
    }

    /// Snapshot of a stopped run. `None` unless the stopwatch is stopped.
    pub fn completed_run(&self) -> Option<CompletedRun> {
        if self.status != StopwatchStatus::Stopped {
            return None;
        }
        Some(CompletedRun {
            start_wall_millis: self.start_wall_millis?,
            end_wall_millis: self.end_wall_millis?,
            total_elapsed_nanos: self.elapsed_nanos(),
            records: self.marks.chronological().cloned().collect(),
        })
    }

    const fn anchor(&self) -> RunningAnchor {
        RunningAnchor {
            started_at: self.started_at,
            total_paused: self.total_paused,
        }
    }

    fn clear(&mut self) {
        self.started_at = Duration::ZERO;
        self.paused_at = Duration::ZERO;
        self.total_paused = Duration::ZERO;
        self.start_wall_millis = None;
        self.end_wall_millis = None;
        self.marks.clear();
    }
}

pub fn duration_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}
