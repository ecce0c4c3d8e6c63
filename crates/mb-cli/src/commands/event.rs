//! Event command: record one wall-clock mark and archive it immediately.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::TimeZone;

use mb_core::format::{format_split, format_wall_clock};
use mb_core::{EventRecorder, WallClock};

use crate::App;

pub fn run<W, C, Tz>(writer: &mut W, app: &mut App<C, Tz>, note: &str) -> Result<()>
where
    W: Write,
    C: WallClock,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut recorder = EventRecorder::new(app.wall.clone());
    app.archiver
        .restore_event_recorder(&app.db, &mut recorder)
        .context("failed to load today's events")?;

    match app.archiver.record_event(&mut app.db, &mut recorder, note) {
        Ok(record) => {
            write!(
                writer,
                "Event #{} at {} ({})",
                record.index,
                format_wall_clock(record.wall_clock_millis, &app.tz),
                format_split(record.split_nanos)
            )?;
            if record.note.is_empty() {
                writeln!(writer)?;
            } else {
                writeln!(writer, ": {}", record.note)?;
            }
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "event not archived");
            if let Some(record) = recorder.marks().newest() {
                writeln!(
                    writer,
                    "Could not save event #{} at {}",
                    record.index,
                    format_wall_clock(record.wall_clock_millis, &app.tz)
                )?;
            }
            Err(e).context("failed to archive event")
        }
    }
}
