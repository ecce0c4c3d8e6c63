//! Browsing archived sessions day by day.
//!
//! A [`HistoryBrowser`] tracks the selected logical date, session kind and
//! session, and publishes an immutable [`HistorySnapshot`] after every change.

use chrono::NaiveDate;
use mb_core::{ArchivedRecord, RecordId, Session, SessionCursor, SessionId, SessionKind};
use serde::Serialize;
use tokio::sync::watch;

use crate::{Database, DbError};

/// What the history view shows at one moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySnapshot {
    pub date: NaiveDate,
    pub kind: SessionKind,
    /// Sessions of `kind` on `date`, oldest first.
    pub sessions: Vec<Session>,
    pub current_session_index: usize,
    /// Records of the selected session, by wall-clock time.
    pub records: Vec<ArchivedRecord>,
}

impl HistorySnapshot {
    const fn empty(date: NaiveDate, kind: SessionKind) -> Self {
        Self {
            date,
            kind,
            sessions: Vec::new(),
            current_session_index: 0,
            records: Vec::new(),
        }
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.sessions.get(self.current_session_index)
    }
}

/// Navigation state over the archive.
///
/// Every mutating method takes the database it should read from, then
/// reloads the selected day and publishes a fresh snapshot.
#[derive(Debug)]
pub struct HistoryBrowser {
    date: NaiveDate,
    kind: SessionKind,
    cursor: SessionCursor,
    state: watch::Sender<HistorySnapshot>,
}

impl HistoryBrowser {
    /// Opens the browser on `date` with the first session selected.
    pub fn open(db: &Database, date: NaiveDate, kind: SessionKind) -> Result<Self, DbError> {
        let (state, _) = watch::channel(HistorySnapshot::empty(date, kind));
        let mut browser = Self {
            date,
            kind,
            cursor: SessionCursor::default(),
            state,
        };
        browser.refresh(db)?;
        Ok(browser)
    }

    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        self.state.borrow().clone()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().current_session().cloned()
    }

    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    pub const fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn select_date(&mut self, db: &Database, date: NaiveDate) -> Result<(), DbError> {
        self.date = date;
        self.cursor.reset();
        self.refresh(db)
    }

    pub fn select_kind(&mut self, db: &Database, kind: SessionKind) -> Result<(), DbError> {
        self.kind = kind;
        self.cursor.reset();
        self.refresh(db)
    }

    pub fn previous_day(&mut self, db: &Database) -> Result<(), DbError> {
        match self.date.pred_opt() {
            Some(date) => self.select_date(db, date),
            None => Ok(()),
        }
    }

    pub fn next_day(&mut self, db: &Database) -> Result<(), DbError> {
        match self.date.succ_opt() {
            Some(date) => self.select_date(db, date),
            None => Ok(()),
        }
    }

    /// Jumps to the closest earlier date with sessions of the current kind.
    ///
    /// Returns `false` and stays put when there is none.
    pub fn previous_marked_date(&mut self, db: &Database) -> Result<bool, DbError> {
        let target = db
            .logical_dates(self.kind)?
            .into_iter()
            .rev()
            .find(|date| *date < self.date);
        self.jump(db, target)
    }

    /// Jumps to the closest later date with sessions of the current kind.
    pub fn next_marked_date(&mut self, db: &Database) -> Result<bool, DbError> {
        let target = db
            .logical_dates(self.kind)?
            .into_iter()
            .find(|date| *date > self.date);
        self.jump(db, target)
    }

    pub fn next_session(&mut self, db: &Database) -> Result<(), DbError> {
        self.cursor.next(self.session_count());
        self.refresh(db)
    }

    pub fn previous_session(&mut self, db: &Database) -> Result<(), DbError> {
        self.cursor.previous(self.session_count());
        self.refresh(db)
    }

    /// Selects a session by position, clamped to the list.
    pub fn select_session(&mut self, db: &Database, index: usize) -> Result<(), DbError> {
        self.cursor.select(index, self.session_count());
        self.refresh(db)
    }

    pub fn rename_session(
        &mut self,
        db: &mut Database,
        id: &SessionId,
        title: &str,
    ) -> Result<bool, DbError> {
        let renamed = db.rename_session(id, title)?;
        self.refresh(db)?;
        Ok(renamed)
    }

    pub fn edit_note(
        &mut self,
        db: &mut Database,
        id: &RecordId,
        note: &str,
    ) -> Result<bool, DbError> {
        let updated = db.set_record_note(id, note)?;
        self.refresh(db)?;
        Ok(updated)
    }

    /// Deletes a session and its records.
    ///
    /// The selection follows the previously selected session if it still
    /// exists; otherwise the index is clamped to the shorter list.
    pub fn delete_session(&mut self, db: &mut Database, id: &SessionId) -> Result<bool, DbError> {
        let selected = self.current_session().map(|session| session.id);
        let deleted = db.delete_session(id)?;
        let sessions = db.list_sessions(self.date, self.kind)?;
        if let Some(pos) = selected
            .as_ref()
            .and_then(|selected| sessions.iter().position(|s| &s.id == selected))
        {
            self.cursor.select(pos, sessions.len());
        }
        self.publish(db, sessions)?;
        Ok(deleted)
    }

    pub fn delete_record(&mut self, db: &mut Database, id: &RecordId) -> Result<bool, DbError> {
        let deleted = db.delete_record(id)?;
        self.refresh(db)?;
        Ok(deleted)
    }

    /// Reloads the selected day and publishes a new snapshot.
    pub fn refresh(&mut self, db: &Database) -> Result<(), DbError> {
        let sessions = db.list_sessions(self.date, self.kind)?;
        self.publish(db, sessions)
    }

    /// Dates with at least one session of the current kind.
    pub fn calendar_markers(&self, db: &Database) -> Result<Vec<NaiveDate>, DbError> {
        db.logical_dates(self.kind)
    }

    fn jump(&mut self, db: &Database, target: Option<NaiveDate>) -> Result<bool, DbError> {
        match target {
            Some(date) => {
                self.select_date(db, date)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn session_count(&self) -> usize {
        self.state.borrow().sessions.len()
    }

    fn publish(&mut self, db: &Database, sessions: Vec<Session>) -> Result<(), DbError> {
        self.cursor.resolve(sessions.len());
        let records = match sessions.get(self.cursor.index()) {
            Some(session) => db.list_records(&session.id)?,
            None => Vec::new(),
        };
        tracing::debug!(
            date = %self.date,
            kind = %self.kind,
            sessions = sessions.len(),
            index = self.cursor.index(),
            "history refreshed"
        );
        self.state.send_replace(HistorySnapshot {
            date: self.date,
            kind: self.kind,
            sessions,
            current_session_index: self.cursor.index(),
            records,
        });
        Ok(())
    }
}
