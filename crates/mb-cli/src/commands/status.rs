//! Status command: configuration in effect and what the store holds.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::TimeZone;

use mb_core::WallClock;
use mb_core::format::format_timestamp;
use mb_core::policy::MAX_RETENTION_DAYS;

use crate::App;

pub fn run<W, C, Tz>(writer: &mut W, app: &App<C, Tz>) -> Result<()>
where
    W: Write,
    C: WallClock,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let policy = app.archiver.policy();
    let stats = app.db.stats()?;

    writeln!(writer, "markbook status")?;
    writeln!(writer, "Database: {}", app.config.database_path.display())?;
    writeln!(writer, "Day boundary: {}", policy.boundary)?;
    if (0..=MAX_RETENTION_DAYS).contains(&policy.retention_days) {
        writeln!(writer, "Retention: {} days", policy.retention_days)?;
    } else {
        writeln!(
            writer,
            "Retention: disabled ({} is out of range)",
            policy.retention_days
        )?;
    }
    writeln!(
        writer,
        "Auto cleanup: {}",
        if app.archiver.auto_cleanup() { "on" } else { "off" }
    )?;
    writeln!(writer, "Now: {}", format_timestamp(app.wall.now_millis(), &app.tz))?;
    writeln!(writer, "Today: {}", app.archiver.today()?)?;
    writeln!(writer, "Sessions: {}", stats.sessions)?;
    writeln!(writer, "Records: {}", stats.records)?;
    if let (Some(first), Some(last)) = (stats.first_date, stats.last_date) {
        writeln!(writer, "Dates: {first} .. {last}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::Config;
    use crate::app::testing::{app, app_with};

    #[test]
    fn status_on_empty_store() {
        let (app, _) = app();
        let mut output = Vec::new();
        run(&mut output, &app).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        markbook status
        Database: /tmp/markbook-test.db
        Day boundary: 00:00
        Retention: 30 days
        Auto cleanup: on
        Now: 2025-06-10 10:00:00.000
        Today: 2025-06-10
        Sessions: 0
        Records: 0
        ");
    }

    #[test]
    fn status_reports_counts_and_date_span() {
        let (mut app, wall) = app_with(Config {
            database_path: "/tmp/markbook-test.db".into(),
            boundary_hour: 11,
            retention_days: -3,
            auto_cleanup: false,
            ..Config::default()
        });
        let mut recorder = mb_core::EventRecorder::new(wall.clone());
        app.archiver
            .record_event(&mut app.db, &mut recorder, "")
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &app).unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        markbook status
        Database: /tmp/markbook-test.db
        Day boundary: 11:00
        Retention: disabled (-3 is out of range)
        Auto cleanup: off
        Now: 2025-06-10 10:00:00.000
        Today: 2025-06-09
        Sessions: 1
        Records: 1
        Dates: 2025-06-09 .. 2025-06-09
        ");
    }
}
