//! Archive policy: which logical day a timestamp belongs to and how long
//! history is kept.
//!
//! A day boundary `B` shifts the start of each logical day. A timestamp whose
//! local time of day is before `B` belongs to the previous calendar date; one
//! at or after `B` belongs to its own date. A boundary of 00:00 never shifts.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use thiserror::Error;
use tokio::sync::watch;

/// Retention values above this are treated as "keep forever".
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Today and yesterday are never swept, whatever the configured retention.
pub const MIN_RETENTION_DAYS: i64 = 2;

pub const DEFAULT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("day boundary hour must be between 0 and 23, got {0}")]
    InvalidHour(u32),
    #[error("day boundary minute must be between 0 and 59, got {0}")]
    InvalidMinute(u32),
}

/// Local time of day at which a new logical day begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    time: NaiveTime,
}

impl DayBoundary {
    pub const MIDNIGHT: Self = Self {
        time: NaiveTime::MIN,
    };

    pub fn new(hour: u32, minute: u32) -> Result<Self, PolicyError> {
        if hour > 23 {
            return Err(PolicyError::InvalidHour(hour));
        }
        if minute > 59 {
            return Err(PolicyError::InvalidMinute(minute));
        }
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self { time })
            .ok_or(PolicyError::InvalidHour(hour))
    }

    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// Logical date of a local date-time.
    pub fn logical_date_of(&self, local: NaiveDateTime) -> NaiveDate {
        let date = local.date();
        if local.time() >= self.time {
            date
        } else {
            date.pred_opt().unwrap_or(date)
        }
    }

    /// Logical date of an epoch-millisecond timestamp seen in `tz`.
    ///
    /// Returns `None` only for timestamps outside chrono's representable range.
    pub fn logical_date<Tz: TimeZone>(&self, millis: i64, tz: &Tz) -> Option<NaiveDate> {
        let utc = DateTime::from_timestamp_millis(millis)?;
        Some(self.logical_date_of(utc.with_timezone(tz).naive_local()))
    }
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::MIDNIGHT
    }
}

impl std::fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.time.format("%H:%M"))
    }
}

/// Oldest logical date that survives a retention sweep.
///
/// Sessions strictly before the returned date are eligible for deletion.
/// `None` means nothing is swept: negative or absurdly large retention values
/// come from malformed configuration and are read as "keep forever".
pub fn retention_cutoff(today: NaiveDate, retention_days: i64) -> Option<NaiveDate> {
    if !(0..=MAX_RETENTION_DAYS).contains(&retention_days) {
        return None;
    }
    let days = u64::try_from(retention_days.max(MIN_RETENTION_DAYS)).ok()?;
    today.checked_sub_days(Days::new(days))
}

/// Settings the archival engine reads on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchivePolicy {
    pub boundary: DayBoundary,
    pub retention_days: i64,
}

impl Default for ArchivePolicy {
    fn default() -> Self {
        Self {
            boundary: DayBoundary::MIDNIGHT,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Source of the current archive policy.
///
/// Implementations may change their answer between calls; consumers must not
/// cache the result.
pub trait ArchiveSettings {
    fn policy(&self) -> ArchivePolicy;
}

impl ArchiveSettings for ArchivePolicy {
    fn policy(&self) -> ArchivePolicy {
        *self
    }
}

impl ArchiveSettings for watch::Receiver<ArchivePolicy> {
    fn policy(&self) -> ArchivePolicy {
        *self.borrow()
    }
}
