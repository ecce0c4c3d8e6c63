//! History command: sessions of one logical day and the selected session's records.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, TimeZone};
use clap::Args;

use mb_core::{SessionKind, WallClock};
use mb_db::{HistoryBrowser, HistorySnapshot};

use super::util::{session_label, write_record};
use crate::App;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Logical date to show (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Session kind: event or stopwatch.
    #[arg(long, default_value = "stopwatch")]
    pub kind: SessionKind,

    /// Session to expand, 1-based.
    #[arg(long)]
    pub session: Option<usize>,

    /// Output the snapshot as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W, C, Tz>(writer: &mut W, app: &App<C, Tz>, args: &HistoryArgs) -> Result<()>
where
    W: Write,
    C: WallClock,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = match args.date {
        Some(date) => date,
        None => app.archiver.today()?,
    };
    let mut browser = HistoryBrowser::open(&app.db, date, args.kind)?;
    if let Some(n) = args.session {
        browser.select_session(&app.db, n.saturating_sub(1))?;
    }
    let snapshot = browser.snapshot();

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&snapshot)?)?;
        return Ok(());
    }
    render(writer, &snapshot, &app.tz)
}

fn render<W, Tz>(writer: &mut W, snapshot: &HistorySnapshot, tz: &Tz) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if snapshot.sessions.is_empty() {
        writeln!(writer, "No {} sessions on {}.", snapshot.kind, snapshot.date)?;
        return Ok(());
    }

    writeln!(
        writer,
        "{} sessions on {}: {}",
        snapshot.kind,
        snapshot.date,
        snapshot.sessions.len()
    )?;
    for (i, session) in snapshot.sessions.iter().enumerate() {
        let marker = if i == snapshot.current_session_index { '*' } else { ' ' };
        writeln!(
            writer,
            "{marker} {}. {}  [{}]",
            i + 1,
            session_label(session, tz),
            session.id
        )?;
    }

    writeln!(writer)?;
    if snapshot.records.is_empty() {
        writeln!(writer, "No records.")?;
        return Ok(());
    }
    for archived in &snapshot.records {
        write_record(writer, &archived.record, snapshot.kind, tz)?;
        writeln!(writer, "       id: {}", archived.record.id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    use insta::assert_snapshot;
    use mb_core::{CompletedRun, EventRecorder, RecordId, Session, TimeRecord};

    use crate::app::testing::{app, millis};

    fn args(kind: SessionKind) -> HistoryArgs {
        HistoryArgs {
            date: None,
            kind,
            session: None,
            json: false,
        }
    }

    fn redact(output: &[u8], sessions: &[Session], records: &[RecordId]) -> String {
        let mut text = String::from_utf8(output.to_vec()).unwrap();
        for (i, session) in sessions.iter().enumerate() {
            text = text.replace(session.id.as_str(), &format!("session-{}", i + 1));
        }
        for (i, id) in records.iter().enumerate() {
            text = text.replace(id.as_str(), &format!("record-{}", i + 1));
        }
        text
    }

    fn run_with_marks(start: i64, title_marks: &[(i64, &str)]) -> CompletedRun {
        let mut previous = 0;
        let records = title_marks
            .iter()
            .enumerate()
            .map(|(i, &(secs, note))| {
                let elapsed = secs * 1_000_000_000;
                let split = elapsed - previous;
                previous = elapsed;
                TimeRecord {
                    id: RecordId::generate(),
                    index: u32::try_from(i + 1).unwrap(),
                    wall_clock_millis: start + secs * 1_000,
                    elapsed_nanos: elapsed,
                    split_nanos: split,
                    note: note.to_string(),
                }
            })
            .collect();
        CompletedRun {
            start_wall_millis: start,
            end_wall_millis: start + 120_000,
            total_elapsed_nanos: 120_000_000_000,
            records,
        }
    }

    #[test]
    fn empty_day_says_so() {
        let (app, _) = app();
        let mut output = Vec::new();
        run(&mut output, &app, &args(SessionKind::Event)).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @"No event sessions on 2025-06-10.");
    }

    #[test]
    fn stopwatch_history_expands_selected_session() {
        let (mut app, _) = app();
        let first = run_with_marks(millis(2025, 6, 10, 8, 0, 0), &[(30, "warmup"), (90, "")]);
        let second = run_with_marks(millis(2025, 6, 10, 9, 0, 0), &[(45, "")]);
        let s1 = app
            .archiver
            .archive_stopwatch_run(&mut app.db, "Easy", &first)
            .unwrap();
        let s2 = app
            .archiver
            .archive_stopwatch_run(&mut app.db, "Tempo", &second)
            .unwrap();

        let mut output = Vec::new();
        let mut history_args = args(SessionKind::Stopwatch);
        history_args.session = Some(2);
        run(&mut output, &app, &history_args).unwrap();

        let text = redact(&output, &[s1, s2], &[second.records[0].id.clone()]);
        assert_snapshot!(text, @r"
        stopwatch sessions on 2025-06-10: 2
          1. Easy  08:00:00-08:02:00  02:00.000  [session-1]
        * 2. Tempo  09:00:00-09:02:00  02:00.000  [session-2]

          #1   00:45.000  +00:45.000  09:00:45
               id: record-1
        ");
    }

    #[test]
    fn event_history_lists_marks() {
        let (mut app, wall) = app();
        let mut recorder = EventRecorder::new(wall.clone());
        app.archiver
            .record_event(&mut app.db, &mut recorder, "start")
            .unwrap();
        wall.advance(Duration::from_secs(300));
        app.archiver
            .record_event(&mut app.db, &mut recorder, "")
            .unwrap();

        let today = app.archiver.today().unwrap();
        let sessions = app.db.list_sessions(today, SessionKind::Event).unwrap();
        let ids: Vec<RecordId> = app
            .db
            .list_records(&sessions[0].id)
            .unwrap()
            .into_iter()
            .map(|r| r.record.id)
            .collect();

        let mut output = Vec::new();
        run(&mut output, &app, &args(SessionKind::Event)).unwrap();

        let text = redact(&output, &sessions, &ids);
        assert_snapshot!(text, @r"
        event sessions on 2025-06-10: 1
        * 1. Events  [session-1]

          #1   10:00:00  +00:00.000  start
               id: record-1
          #2   10:05:00  +05:00.000
               id: record-2
        ");
    }

    #[test]
    fn json_output_is_the_snapshot() {
        let (mut app, wall) = app();
        let mut recorder = EventRecorder::new(wall);
        app.archiver
            .record_event(&mut app.db, &mut recorder, "x")
            .unwrap();

        let mut output = Vec::new();
        let mut history_args = args(SessionKind::Event);
        history_args.json = true;
        run(&mut output, &app, &history_args).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["date"], "2025-06-10");
        assert_eq!(json["kind"], "event");
        assert_eq!(json["current_session_index"], 0);
        assert_eq!(json["records"][0]["note"], "x");
    }
}
