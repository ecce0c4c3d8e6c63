//! Archival engine: moves live marks into the store and keeps the store tidy.
//!
//! Stopwatch runs are archived as a batch when the run is saved. Event marks
//! are archived one at a time as they are recorded, into the single event
//! session of their logical day.

use chrono::{NaiveDate, TimeZone};
use mb_core::{
    ArchivePolicy, ArchiveSettings, CompletedRun, EventRecorder, Session, SessionKind, TimeRecord,
    WallClock, retention_cutoff,
};

use crate::{Database, DbError};

/// Outcome of a maintenance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaintenanceReport {
    /// Sessions strictly before this date were swept. `None` when the
    /// retention setting disabled the sweep.
    pub cutoff: Option<NaiveDate>,
    pub expired_sessions: usize,
    pub orphan_sessions: usize,
}

/// Archives live captures according to the current [`ArchivePolicy`].
///
/// The policy is read from `settings` on every call, so a
/// `watch::Receiver<ArchivePolicy>` makes configuration changes visible
/// without rebuilding the archiver.
#[derive(Debug, Clone)]
pub struct Archiver<S, W, Tz>
where
    S: ArchiveSettings,
    W: WallClock,
    Tz: TimeZone,
{
    settings: S,
    wall: W,
    tz: Tz,
    auto_cleanup: bool,
}

impl<S, W, Tz> Archiver<S, W, Tz>
where
    S: ArchiveSettings,
    W: WallClock,
    Tz: TimeZone,
{
    pub const fn new(settings: S, wall: W, tz: Tz) -> Self {
        Self {
            settings,
            wall,
            tz,
            auto_cleanup: false,
        }
    }

    /// Runs [`run_maintenance`](Self::run_maintenance) after every
    /// successful archive.
    #[must_use]
    pub const fn with_auto_cleanup(mut self, enabled: bool) -> Self {
        self.auto_cleanup = enabled;
        self
    }

    pub const fn set_auto_cleanup(&mut self, enabled: bool) {
        self.auto_cleanup = enabled;
    }

    pub const fn auto_cleanup(&self) -> bool {
        self.auto_cleanup
    }

    pub fn policy(&self) -> ArchivePolicy {
        self.settings.policy()
    }

    /// Logical date of the current wall-clock time.
    pub fn today(&self) -> Result<NaiveDate, DbError> {
        self.logical_date_of(self.wall.now_millis())
    }

    /// Logical date of an epoch-millisecond timestamp.
    pub fn logical_date_of(&self, millis: i64) -> Result<NaiveDate, DbError> {
        self.policy()
            .boundary
            .logical_date(millis, &self.tz)
            .ok_or(DbError::TimestampOutOfRange(millis))
    }

    /// Archives a stopped run as one titled stopwatch session.
    ///
    /// The session's logical date comes from the run's wall-clock start.
    pub fn archive_stopwatch_run(
        &self,
        db: &mut Database,
        title: &str,
        run: &CompletedRun,
    ) -> Result<Session, DbError> {
        if run.records.is_empty() {
            return Err(DbError::EmptyArchive);
        }
        let date = self.logical_date_of(run.start_wall_millis)?;
        let session = Session::stopwatch(date, title, run, self.wall.now_millis())?;
        db.archive_session(&session, &run.records)?;
        tracing::info!(
            session = %session.id,
            %date,
            records = run.records.len(),
            "stopwatch run archived"
        );
        self.after_archive(db);
        Ok(session)
    }

    /// Archives one event mark into its logical day's event session.
    pub fn archive_event(
        &self,
        db: &mut Database,
        record: &TimeRecord,
    ) -> Result<(Session, TimeRecord), DbError> {
        let (session, mut stored) = self.archive_event_batch(db, std::slice::from_ref(record))?;
        let stored = stored.pop().ok_or(DbError::EmptyArchive)?;
        Ok((session, stored))
    }

    /// Archives several event marks in one transaction.
    ///
    /// All marks go to the event session of the first mark's logical date.
    pub fn archive_event_batch(
        &self,
        db: &mut Database,
        records: &[TimeRecord],
    ) -> Result<(Session, Vec<TimeRecord>), DbError> {
        let archived = self.append_events(db, records)?;
        self.after_archive(db);
        Ok(archived)
    }

    /// Records an event mark and persists it immediately.
    ///
    /// If the recorder still holds an earlier day's marks, those that never
    /// reached the store are archived first and the recorder is then rolled
    /// over to today. When that archive fails the recorder is left untouched.
    /// If persisting the new mark fails, the mark stays in the recorder and
    /// the error is returned. Maintenance runs at most once per call.
    pub fn record_event<RW: WallClock>(
        &self,
        db: &mut Database,
        recorder: &mut EventRecorder<RW>,
        note: impl Into<String>,
    ) -> Result<TimeRecord, DbError> {
        let today = self.today()?;
        if recorder.logical_date().is_some_and(|day| day != today) {
            let stale: Vec<TimeRecord> = recorder.marks().chronological().cloned().collect();
            self.archive_unsaved(db, &stale)?;
        }
        recorder.roll_over(today);

        let record = recorder.record_event(note).clone();
        let (_, mut stored) = self.append_events(db, std::slice::from_ref(&record))?;
        self.after_archive(db);
        stored.pop().ok_or(DbError::EmptyArchive)
    }

    /// Loads today's archived event marks into `recorder`.
    ///
    /// Returns the number of marks restored.
    pub fn restore_event_recorder<RW: WallClock>(
        &self,
        db: &Database,
        recorder: &mut EventRecorder<RW>,
    ) -> Result<usize, DbError> {
        let today = self.today()?;
        let mut records = Vec::new();
        for session in db.list_sessions(today, SessionKind::Event)? {
            records.extend(
                db.list_records(&session.id)?
                    .into_iter()
                    .map(|archived| archived.record),
            );
        }
        let count = records.len();
        recorder.restore(today, records);
        tracing::debug!(%today, count, "event recorder restored");
        Ok(count)
    }

    /// Deletes sessions older than the retention window.
    ///
    /// Today and yesterday always survive. A retention value outside the
    /// accepted range skips the sweep.
    pub fn sweep_retention(
        &self,
        db: &mut Database,
    ) -> Result<(Option<NaiveDate>, usize), DbError> {
        let retention_days = self.policy().retention_days;
        let today = self.today()?;
        let Some(cutoff) = retention_cutoff(today, retention_days) else {
            tracing::warn!(retention_days, "retention out of range, sweep skipped");
            return Ok((None, 0));
        };
        let deleted = db.delete_sessions_before(cutoff)?;
        if deleted > 0 {
            tracing::info!(%cutoff, deleted, "expired sessions swept");
        }
        Ok((Some(cutoff), deleted))
    }

    /// Deletes event sessions left without records.
    pub fn clean_orphans(&self, db: &mut Database) -> Result<usize, DbError> {
        let deleted = db.delete_empty_event_sessions()?;
        if deleted > 0 {
            tracing::info!(deleted, "empty event sessions removed");
        }
        Ok(deleted)
    }

    /// Retention sweep followed by orphan cleanup.
    pub fn run_maintenance(&self, db: &mut Database) -> Result<MaintenanceReport, DbError> {
        let (cutoff, expired_sessions) = self.sweep_retention(db)?;
        let orphan_sessions = self.clean_orphans(db)?;
        Ok(MaintenanceReport {
            cutoff,
            expired_sessions,
            orphan_sessions,
        })
    }

    fn archive_unsaved(&self, db: &mut Database, records: &[TimeRecord]) -> Result<(), DbError> {
        let mut unsaved = Vec::new();
        for record in records {
            if !db.record_exists(&record.id)? {
                unsaved.push(record.clone());
            }
        }
        if !unsaved.is_empty() {
            tracing::info!(count = unsaved.len(), "archiving marks left from an earlier day");
            self.append_events(db, &unsaved)?;
        }
        Ok(())
    }

    fn append_events(
        &self,
        db: &mut Database,
        records: &[TimeRecord],
    ) -> Result<(Session, Vec<TimeRecord>), DbError> {
        let first = records.first().ok_or(DbError::EmptyArchive)?;
        let date = self.logical_date_of(first.wall_clock_millis)?;
        let (session, stored) = db.append_to_event_day(date, self.wall.now_millis(), records)?;
        tracing::info!(
            session = %session.id,
            %date,
            records = stored.len(),
            "event marks archived"
        );
        Ok((session, stored))
    }

    fn after_archive(&self, db: &mut Database) {
        if !self.auto_cleanup {
            return;
        }
        if let Err(e) = self.run_maintenance(db) {
            tracing::warn!(error = %e, "maintenance after archive failed");
        }
    }
}
