//! Interactive stopwatch: one command per input line.
//!
//! The live state stays in memory until `save`. A failed save keeps every
//! mark so the run can be saved again.

use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use chrono::TimeZone;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;

use mb_core::format::{format_elapsed, format_split, format_wall_clock};
use mb_core::stopwatch::duration_nanos;
use mb_core::{MonotonicClock, StopwatchCapture, StopwatchCommand, StopwatchStatus, WallClock};
use mb_db::DbError;

use crate::App;

const HELP: &str = "\
commands:
  start | pause | resume | stop | reset
  mark [note]          record a mark (running only)
  note <index> <text>  set a mark's note
  delete <index>       delete a mark
  show                 status, elapsed time and marks
  save [title]         archive a stopped run
  reload               re-read configuration
  quit";

/// Whether the loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct StopwatchRepl<M: MonotonicClock, C: WallClock> {
    capture: StopwatchCapture<M, C>,
    elapsed: watch::Receiver<Duration>,
    wall: watch::Receiver<i64>,
}

impl<M: MonotonicClock, C: WallClock> StopwatchRepl<M, C> {
    /// Must be called from within a Tokio runtime.
    pub fn new(monotonic: M, wall: C) -> Self {
        let capture = StopwatchCapture::new(monotonic, wall);
        let elapsed = capture.subscribe_elapsed();
        let wall = capture.subscribe_wall();
        Self {
            capture,
            elapsed,
            wall,
        }
    }

    pub const fn capture(&self) -> &StopwatchCapture<M, C> {
        &self.capture
    }

    /// Executes one input line.
    pub fn handle<W, Tz>(&mut self, line: &str, app: &mut App<C, Tz>, out: &mut W) -> Result<Flow>
    where
        W: Write,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(command, rest)| (command, rest.trim()));

        match command {
            "" => {}
            "start" => self.transition(StopwatchCommand::Start, command, out)?,
            "pause" => self.transition(StopwatchCommand::Pause, command, out)?,
            "resume" => self.transition(StopwatchCommand::Resume, command, out)?,
            "stop" => self.transition(StopwatchCommand::Stop, command, out)?,
            "reset" => self.transition(StopwatchCommand::Reset, command, out)?,
            "mark" => self.mark(rest, &app.tz, out)?,
            "note" => self.note(rest, out)?,
            "delete" => self.delete(rest, out)?,
            "show" => self.show(&app.tz, out)?,
            "save" => self.save(rest, app, out)?,
            "reload" => match app.reload() {
                Ok(config) => writeln!(
                    out,
                    "configuration reloaded (boundary {:02}:{:02}, retention {} days)",
                    config.boundary_hour, config.boundary_minute, config.retention_days
                )?,
                Err(e) => {
                    tracing::warn!(error = %e, "reload failed");
                    writeln!(out, "reload failed: {e:#}")?;
                }
            },
            "help" => writeln!(out, "{HELP}")?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => writeln!(out, "unknown command: {other} (try help)")?,
        }
        Ok(Flow::Continue)
    }

    fn transition<W: Write>(
        &mut self,
        command: StopwatchCommand,
        name: &str,
        out: &mut W,
    ) -> Result<()> {
        let status = self.capture.status();
        if self.capture.apply(command) {
            writeln!(
                out,
                "{} {}",
                self.capture.status(),
                format_elapsed(self.elapsed_nanos())
            )?;
        } else {
            writeln!(out, "cannot {name} while {status}")?;
        }
        Ok(())
    }

    fn mark<W, Tz>(&mut self, note: &str, tz: &Tz, out: &mut W) -> Result<()>
    where
        W: Write,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let Some(record) = self.capture.add_mark(note) else {
            writeln!(out, "marks are only accepted while running")?;
            return Ok(());
        };
        let line = format!(
            "#{} {} {} {} {}",
            record.index,
            format_elapsed(record.elapsed_nanos),
            format_split(record.split_nanos),
            format_wall_clock(record.wall_clock_millis, tz),
            record.note
        );
        writeln!(out, "{}", line.trim_end())?;
        Ok(())
    }

    fn note<W: Write>(&mut self, args: &str, out: &mut W) -> Result<()> {
        let (index, text) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        let Some(index) = parse_index(index, out)? else {
            return Ok(());
        };
        let id = self
            .capture
            .stopwatch()
            .marks()
            .by_index(index)
            .map(|record| record.id.clone());
        match id {
            Some(id) => {
                self.capture.set_note(&id, text.trim());
                writeln!(out, "note set on #{index}")?;
            }
            None => writeln!(out, "no mark #{index}")?,
        }
        Ok(())
    }

    fn delete<W: Write>(&mut self, args: &str, out: &mut W) -> Result<()> {
        let Some(index) = parse_index(args, out)? else {
            return Ok(());
        };
        if self.capture.delete_mark_at(index).is_some() {
            writeln!(out, "deleted #{index}")?;
        } else {
            writeln!(out, "no mark #{index}")?;
        }
        Ok(())
    }

    fn show<W, Tz>(&self, tz: &Tz, out: &mut W) -> Result<()>
    where
        W: Write,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        writeln!(
            out,
            "{} {}  (now {})",
            self.capture.status(),
            format_elapsed(self.elapsed_nanos()),
            format_wall_clock(*self.wall.borrow(), tz)
        )?;
        for record in self.capture.stopwatch().marks().iter() {
            let line = format!(
                "  #{:<3} {}  {}  {}  {}",
                record.index,
                format_elapsed(record.elapsed_nanos),
                format_split(record.split_nanos),
                format_wall_clock(record.wall_clock_millis, tz),
                record.note
            );
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }

    fn save<W, Tz>(&mut self, title: &str, app: &mut App<C, Tz>, out: &mut W) -> Result<()>
    where
        W: Write,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let Some(run) = self.capture.stopwatch().completed_run() else {
            writeln!(out, "stop the stopwatch before saving")?;
            return Ok(());
        };
        let title = if title.is_empty() {
            format!("Run {}", format_wall_clock(run.start_wall_millis, &app.tz))
        } else {
            title.to_string()
        };

        match app.archiver.archive_stopwatch_run(&mut app.db, &title, &run) {
            Ok(session) => {
                writeln!(
                    out,
                    "saved \"{}\" with {} mark(s) on {}",
                    session.title,
                    run.records.len(),
                    session.logical_date
                )?;
                self.capture.reset();
            }
            Err(DbError::EmptyArchive) => writeln!(out, "nothing to save: no marks recorded")?,
            Err(e) => {
                tracing::warn!(error = %e, "stopwatch run not archived");
                writeln!(out, "could not save: {e}; marks kept")?;
            }
        }
        Ok(())
    }

    /// Elapsed time as last published to the display channel.
    fn elapsed_nanos(&self) -> i64 {
        duration_nanos(*self.elapsed.borrow())
    }
}

fn parse_index<W: Write>(arg: &str, out: &mut W) -> Result<Option<u32>> {
    if let Ok(index) = arg.trim().parse::<u32>() {
        Ok(Some(index))
    } else {
        writeln!(out, "expected a mark number, got {arg:?}")?;
        Ok(None)
    }
}

/// Reads commands from `input` until `quit` or end of input.
pub async fn run<R, W, M, C, Tz>(
    input: R,
    out: &mut W,
    app: &mut App<C, Tz>,
    monotonic: M,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    M: MonotonicClock,
    C: WallClock,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut repl = StopwatchRepl::new(monotonic, app.wall.clone());
    let mut lines = input.lines();
    writeln!(out, "stopwatch ready (type help for commands)")?;
    out.flush()?;

    while let Some(line) = lines.next_line().await? {
        let flow = repl.handle(&line, app, out)?;
        out.flush()?;
        if flow == Flow::Quit {
            break;
        }
    }

    let unsaved = repl.capture().stopwatch().marks().len();
    if unsaved > 0 && repl.capture().status() != StopwatchStatus::Idle {
        tracing::warn!(unsaved, "leaving stopwatch with unsaved marks");
        writeln!(out, "discarded {unsaved} unsaved mark(s)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use mb_core::{ManualMonotonicClock, SessionKind};

    use crate::app::testing::app;

    fn feed<M: MonotonicClock>(
        repl: &mut StopwatchRepl<M, mb_core::ManualWallClock>,
        app: &mut App<mb_core::ManualWallClock, chrono::Utc>,
        out: &mut Vec<u8>,
        lines: &[&str],
    ) {
        for line in lines {
            repl.handle(line, app, out).unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn paused_time_is_excluded_and_run_is_saved() {
        let (mut app, wall) = app();
        let mono = ManualMonotonicClock::new();
        let mut repl = StopwatchRepl::new(mono.clone(), wall.clone());
        let mut out = Vec::new();

        feed(&mut repl, &mut app, &mut out, &["start"]);
        mono.advance(Duration::from_secs(60));
        wall.advance(Duration::from_secs(60));
        feed(&mut repl, &mut app, &mut out, &["mark first lap", "pause"]);
        mono.advance(Duration::from_secs(30));
        wall.advance(Duration::from_secs(30));
        feed(&mut repl, &mut app, &mut out, &["resume"]);
        mono.advance(Duration::from_secs(15));
        wall.advance(Duration::from_secs(15));
        feed(
            &mut repl,
            &mut app,
            &mut out,
            &["mark", "pause", "stop", "show", "save Intervals"],
        );

        assert_snapshot!(String::from_utf8(out).unwrap(), @r#"
        running 00:00.000
        #1 01:00.000 +00:00.000 10:01:00 first lap
        paused 01:00.000
        running 01:00.000
        #2 01:15.000 +00:15.000 10:01:45
        paused 01:15.000
        stopped 01:15.000
        stopped 01:15.000  (now 10:00:00)
          #2   01:15.000  +00:15.000  10:01:45
          #1   01:00.000  +00:00.000  10:01:00  first lap
        saved "Intervals" with 2 mark(s) on 2025-06-10
        "#);

        assert_eq!(repl.capture().status(), StopwatchStatus::Idle);
        let today = app.archiver.today().unwrap();
        let sessions = app.db.list_sessions(today, SessionKind::Stopwatch).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].total_elapsed_nanos, Some(75_000_000_000));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_commands_are_reported_not_applied() {
        let (mut app, wall) = app();
        let mut repl = StopwatchRepl::new(ManualMonotonicClock::new(), wall);
        let mut out = Vec::new();

        feed(
            &mut repl,
            &mut app,
            &mut out,
            &["pause", "mark", "start", "stop", "delete x", "note 4 hi", "save", "dance"],
        );

        assert_snapshot!(String::from_utf8(out).unwrap(), @r#"
        cannot pause while idle
        marks are only accepted while running
        running 00:00.000
        cannot stop while running
        expected a mark number, got "x"
        no mark #4
        stop the stopwatch before saving
        unknown command: dance (try help)
        "#);
        assert_eq!(repl.capture().status(), StopwatchStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn saving_without_marks_keeps_state() {
        let (mut app, wall) = app();
        let mut repl = StopwatchRepl::new(ManualMonotonicClock::new(), wall);
        let mut out = Vec::new();

        feed(&mut repl, &mut app, &mut out, &["start", "pause", "stop", "save"]);

        assert!(String::from_utf8(out).unwrap().ends_with("nothing to save: no marks recorded\n"));
        assert_eq!(repl.capture().status(), StopwatchStatus::Stopped);
        assert_eq!(app.db.stats().unwrap().sessions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_a_mark_renumbers_the_rest() {
        let (mut app, wall) = app();
        let mono = ManualMonotonicClock::new();
        let mut repl = StopwatchRepl::new(mono.clone(), wall);
        let mut out = Vec::new();

        feed(&mut repl, &mut app, &mut out, &["start"]);
        for _ in 0..3 {
            mono.advance(Duration::from_secs(10));
            feed(&mut repl, &mut app, &mut out, &["mark"]);
        }
        feed(&mut repl, &mut app, &mut out, &["delete 2", "note 2 last"]);

        let marks = repl.capture().stopwatch().marks();
        let rows: Vec<(u32, i64, String)> = marks
            .chronological()
            .map(|m| (m.index, m.split_nanos, m.note.clone()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (1, 0, String::new()),
                (2, 20_000_000_000, "last".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_reads_until_quit() {
        let (mut app, _) = app();
        let mut out = Vec::new();
        let input: &[u8] = b"start\nquit\nstart\n";

        run(input, &mut out, &mut app, ManualMonotonicClock::new())
            .await
            .unwrap();

        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        stopwatch ready (type help for commands)
        running 00:00.000
        ");
    }
}
