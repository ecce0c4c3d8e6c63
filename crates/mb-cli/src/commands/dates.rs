//! Dates command: calendar markers for one session kind.

use std::io::Write;

use anyhow::Result;

use mb_core::SessionKind;
use mb_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, kind: SessionKind) -> Result<()> {
    let dates = db.logical_dates(kind)?;
    if dates.is_empty() {
        writeln!(writer, "No {kind} sessions recorded.")?;
        return Ok(());
    }
    for date in dates {
        writeln!(writer, "{date}")?;
    }
    Ok(())
}
