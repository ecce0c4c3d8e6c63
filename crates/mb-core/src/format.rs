//! Fixed-width display strings for durations and timestamps.

use std::fmt::Display;

use chrono::TimeZone;

const NANOS_PER_MILLI: i64 = 1_000_000;
const MILLIS_PER_SECOND: i64 = 1_000;
const SECONDS_PER_MINUTE: i64 = 60;

/// Formats a duration as `MM:SS.mmm`.
///
/// Minutes keep counting past 59 (`125:03.042`) rather than rolling into an
/// hour field. Negative durations render as zero.
pub fn format_elapsed(nanos: i64) -> String {
    let total_millis = nanos.max(0) / NANOS_PER_MILLI;
    let millis = total_millis % MILLIS_PER_SECOND;
    let total_seconds = total_millis / MILLIS_PER_SECOND;
    let seconds = total_seconds % SECONDS_PER_MINUTE;
    let minutes = total_seconds / SECONDS_PER_MINUTE;
    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

/// Formats a split with an explicit sign, e.g. `+00:05.000`.
pub fn format_split(nanos: i64) -> String {
    format!("+{}", format_elapsed(nanos))
}

/// Formats an epoch-millisecond timestamp as `HH:MM:SS` in `tz`.
pub fn format_wall_clock<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(millis).single().map_or_else(
        || "--:--:--".to_string(),
        |dt| dt.format("%H:%M:%S").to_string(),
    )
}

/// Formats an epoch-millisecond timestamp as `YYYY-MM-DD HH:MM:SS.mmm` in `tz`.
pub fn format_timestamp<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    tz.timestamp_millis_opt(millis).single().map_or_else(
        || "----------".to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    )
}
