//! Cleanup command: retention sweep followed by orphan cleanup.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::TimeZone;

use mb_core::WallClock;

use crate::App;

pub fn run<W: Write, C: WallClock, Tz: TimeZone>(
    writer: &mut W,
    app: &mut App<C, Tz>,
) -> Result<()> {
    let report = app
        .archiver
        .run_maintenance(&mut app.db)
        .context("cleanup failed")?;

    match report.cutoff {
        Some(cutoff) => writeln!(
            writer,
            "Removed {} session(s) before {cutoff}",
            report.expired_sessions
        )?,
        None => writeln!(writer, "Retention sweep skipped")?,
    }
    writeln!(
        writer,
        "Removed {} empty event session(s)",
        report.orphan_sessions
    )?;
    Ok(())
}
