//! Shared rendering helpers for CLI commands.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::TimeZone;

use mb_core::format::{format_elapsed, format_split, format_wall_clock};
use mb_core::{Session, SessionKind, TimeRecord};

/// Writes one mark as a table row.
///
/// Stopwatch marks show elapsed time first; event marks have none.
pub fn write_record<W, Tz>(
    writer: &mut W,
    record: &TimeRecord,
    kind: SessionKind,
    tz: &Tz,
) -> io::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let wall = format_wall_clock(record.wall_clock_millis, tz);
    let split = format_split(record.split_nanos);
    let line = match kind {
        SessionKind::Stopwatch => format!(
            "  #{:<3} {}  {}  {}  {}",
            record.index,
            format_elapsed(record.elapsed_nanos),
            split,
            wall,
            record.note
        ),
        SessionKind::Event => {
            format!("  #{:<3} {}  {}  {}", record.index, wall, split, record.note)
        }
    };
    writeln!(writer, "{}", line.trim_end())
}

/// Short human label for a session.
pub fn session_label<Tz>(session: &Session, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match session.kind {
        SessionKind::Event => "Events".to_string(),
        SessionKind::Stopwatch => {
            let span = match (session.start_time, session.end_time) {
                (Some(start), Some(end)) => format!(
                    "{}-{}",
                    format_wall_clock(start, tz),
                    format_wall_clock(end, tz)
                ),
                _ => "--:--:--".to_string(),
            };
            let total = format_elapsed(session.total_elapsed_nanos.unwrap_or_default());
            format!("{}  {span}  {total}", session.title)
        }
    }
}
