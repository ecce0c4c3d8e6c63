//! Storage layer for markbook.
//!
//! Provides persistence for sessions and their records using `rusqlite`, plus
//! the archival engine ([`archive`]) and the history browser ([`history`])
//! built on top of it.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Every write takes `&mut self`, so a single owner serialises all writes; the
//! store assumes it is the only writer of the file.
//!
//! # Schema
//!
//! - `sessions.logical_date` is TEXT in `YYYY-MM-DD` form, so lexicographic
//!   comparison matches date order.
//! - `created_at`, `start_time`, `end_time` and `records.wall_clock_time` are
//!   INTEGER Unix-epoch milliseconds.
//! - `elapsed_nanos`, `split_nanos` and `total_elapsed_nanos` are INTEGER
//!   nanoseconds.
//! - A partial unique index allows at most one `event` session per logical date.
//! - `records.session_id` cascades on delete, so removing a session removes its
//!   records. Foreign keys are enabled on every connection.

pub mod archive;
pub mod history;

use std::path::Path;

use chrono::NaiveDate;
use mb_core::{
    ArchivedRecord, RecordId, Session, SessionId, SessionKind, SplitBasis, TimeRecord,
    ValidationError, validate_title,
};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

pub use archive::{Archiver, MaintenanceReport};
pub use history::{HistoryBrowser, HistorySnapshot};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SESSION_COLUMNS: &str =
    "id, logical_date, type, title, created_at, total_elapsed_nanos, start_time, end_time";

const RECORD_COLUMNS: &str =
    "id, session_id, seq_index, wall_clock_time, elapsed_nanos, split_nanos, note";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Archiving was asked to persist zero records.
    #[error("refusing to archive an empty record list")]
    EmptyArchive,
    /// A value failed domain validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A stored row could not be mapped back to the domain model.
    #[error("invalid {column} for {id}: {value}")]
    InvalidRow {
        id: String,
        column: &'static str,
        value: String,
    },
    /// A timestamp could not be placed on a calendar.
    #[error("timestamp out of range: {0} ms")]
    TimestampOutOfRange(i64),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Aggregate counts for status output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub sessions: usize,
    pub records: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                logical_date TEXT NOT NULL,
                type TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                total_elapsed_nanos INTEGER,
                start_time INTEGER,
                end_time INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_date_type ON sessions(logical_date, type);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_event_day
                ON sessions(logical_date) WHERE type = 'event';

            CREATE TABLE IF NOT EXISTS records (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                seq_index INTEGER NOT NULL,
                wall_clock_time INTEGER NOT NULL,
                elapsed_nanos INTEGER NOT NULL DEFAULT 0,
                split_nanos INTEGER NOT NULL DEFAULT 0,
                note TEXT NOT NULL DEFAULT '',
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_records_session ON records(session_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts a new session together with its records as one transaction.
    ///
    /// Fails with [`DbError::EmptyArchive`] when `records` is empty; nothing
    /// is written in that case.
    pub fn archive_session(
        &mut self,
        session: &Session,
        records: &[TimeRecord],
    ) -> Result<(), DbError> {
        if records.is_empty() {
            return Err(DbError::EmptyArchive);
        }
        let tx = self.conn.transaction()?;
        insert_session(&tx, session)?;
        insert_records(&tx, &session.id, records, None)?;
        tx.commit()?;
        tracing::debug!(session = %session.id, count = records.len(), "session archived");
        Ok(())
    }

    /// Appends records to the event session of `date`, creating it on first use.
    ///
    /// Runs as one transaction. The session is renumbered by wall-clock
    /// order afterwards, so a late mark slots in before newer ones. Stored
    /// records are returned with their resolved index and split.
    pub fn append_to_event_day(
        &mut self,
        date: NaiveDate,
        created_at: i64,
        records: &[TimeRecord],
    ) -> Result<(Session, Vec<TimeRecord>), DbError> {
        if records.is_empty() {
            return Err(DbError::EmptyArchive);
        }
        let tx = self.conn.transaction()?;
        let session = match find_event_session(&tx, date)? {
            Some(session) => session,
            None => {
                let session = Session::event(date, created_at);
                insert_session(&tx, &session)?;
                tracing::debug!(session = %session.id, %date, "event session created");
                session
            }
        };
        let next_index: u32 = tx.query_row(
            "SELECT COALESCE(MAX(seq_index), 0) FROM records WHERE session_id = ?",
            [session.id.as_str()],
            |row| row.get(0),
        )?;
        let mut stored = insert_records(&tx, &session.id, records, Some(next_index + 1))?;
        resequence(&tx, session.id.as_str())?;
        {
            let mut stmt = tx.prepare("SELECT seq_index, split_nanos FROM records WHERE id = ?")?;
            for record in &mut stored {
                (record.index, record.split_nanos) =
                    stmt.query_row([record.id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?;
            }
        }
        tx.commit()?;
        Ok((session, stored))
    }

    /// Looks up a session by ID.
    pub fn get_session(&self, id: &SessionId) -> Result<Option<Session>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"),
                [id.as_str()],
                read_session_row,
            )
            .optional()?;
        row.map(SessionRow::into_session).transpose()
    }

    /// Lists sessions of one kind on one logical date, oldest first.
    pub fn list_sessions(
        &self,
        date: NaiveDate,
        kind: SessionKind,
    ) -> Result<Vec<Session>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {SESSION_COLUMNS}
            FROM sessions
            WHERE logical_date = ? AND type = ?
            ORDER BY created_at ASC, rowid ASC
            "
        ))?;
        let rows = stmt.query_map(params![format_date(date), kind.as_str()], read_session_row)?;
        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }
        Ok(sessions)
    }

    /// Most recent session of a kind, by logical date then creation time.
    pub fn latest_session(&self, kind: SessionKind) -> Result<Option<Session>, DbError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "
                    SELECT {SESSION_COLUMNS}
                    FROM sessions
                    WHERE type = ?
                    ORDER BY logical_date DESC, created_at DESC, rowid DESC
                    LIMIT 1
                    "
                ),
                [kind.as_str()],
                read_session_row,
            )
            .optional()?;
        row.map(SessionRow::into_session).transpose()
    }

    /// Lists a session's records ordered by wall-clock time.
    ///
    /// Records that were archived out of order come back in the order they
    /// were marked.
    pub fn list_records(&self, session_id: &SessionId) -> Result<Vec<ArchivedRecord>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT {RECORD_COLUMNS}
            FROM records
            WHERE session_id = ?
            ORDER BY wall_clock_time ASC, seq_index ASC
            "
        ))?;
        let rows = stmt.query_map([session_id.as_str()], read_record_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_archived()?);
        }
        Ok(records)
    }

    /// Whether a record with this ID has been stored.
    pub fn record_exists(&self, id: &RecordId) -> Result<bool, DbError> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM records WHERE id = ?", [id.as_str()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Distinct logical dates that have at least one session of `kind`.
    pub fn logical_dates(&self, kind: SessionKind) -> Result<Vec<NaiveDate>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT DISTINCT logical_date
            FROM sessions
            WHERE type = ?
            ORDER BY logical_date ASC
            ",
        )?;
        let rows = stmt.query_map([kind.as_str()], |row| row.get::<_, String>(0))?;
        let mut dates = Vec::new();
        for row in rows {
            let value = row?;
            dates.push(parse_date(&value, &value)?);
        }
        Ok(dates)
    }

    /// Renames a session. Returns `false` if the session does not exist.
    ///
    /// Stopwatch titles must be non-empty; event sessions cannot be titled.
    pub fn rename_session(&mut self, id: &SessionId, title: &str) -> Result<bool, DbError> {
        let Some(session) = self.get_session(id)? else {
            return Ok(false);
        };
        let title = validate_title(session.kind, title)?;
        let updated = self.conn.execute(
            "UPDATE sessions SET title = ? WHERE id = ?",
            params![title, id.as_str()],
        )?;
        Ok(updated > 0)
    }

    /// Replaces an archived record's note. Returns `false` if it does not exist.
    pub fn set_record_note(&mut self, id: &RecordId, note: &str) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE records SET note = ? WHERE id = ?",
            params![note, id.as_str()],
        )?;
        Ok(updated > 0)
    }

    /// Deletes a session and, by cascade, its records.
    pub fn delete_session(&mut self, id: &SessionId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?", [id.as_str()])?;
        Ok(deleted > 0)
    }

    /// Deletes one record and renumbers the rest of its session.
    pub fn delete_record(&mut self, id: &RecordId) -> Result<bool, DbError> {
        let tx = self.conn.transaction()?;
        let session_id: Option<String> = tx
            .query_row(
                "SELECT session_id FROM records WHERE id = ?",
                [id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(session_id) = session_id else {
            return Ok(false);
        };
        tx.execute("DELETE FROM records WHERE id = ?", [id.as_str()])?;
        resequence(&tx, &session_id)?;
        tx.commit()?;
        Ok(true)
    }

    /// Deletes every session whose logical date is strictly before `cutoff`.
    pub fn delete_sessions_before(&mut self, cutoff: NaiveDate) -> Result<usize, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM sessions WHERE logical_date < ?",
            [format_date(cutoff)],
        )?;
        Ok(deleted)
    }

    /// Deletes event sessions that have no records left.
    ///
    /// Stopwatch sessions are kept even when empty.
    pub fn delete_empty_event_sessions(&mut self) -> Result<usize, DbError> {
        let deleted = self.conn.execute(
            "
            DELETE FROM sessions
            WHERE type = 'event'
              AND NOT EXISTS (SELECT 1 FROM records WHERE records.session_id = sessions.id)
            ",
            [],
        )?;
        Ok(deleted)
    }

    /// Row counts and the span of stored logical dates.
    pub fn stats(&self) -> Result<StoreStats, DbError> {
        let (sessions, first, last): (i64, Option<String>, Option<String>) = self.conn.query_row(
            "SELECT COUNT(*), MIN(logical_date), MAX(logical_date) FROM sessions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let records: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(StoreStats {
            sessions: usize::try_from(sessions).unwrap_or_default(),
            records: usize::try_from(records).unwrap_or_default(),
            first_date: first.map(|d| parse_date(&d, "sessions")).transpose()?,
            last_date: last.map(|d| parse_date(&d, "sessions")).transpose()?,
        })
    }
}

#[derive(Debug)]
struct SessionRow {
    id: String,
    logical_date: String,
    kind: String,
    title: String,
    created_at: i64,
    total_elapsed_nanos: Option<i64>,
    start_time: Option<i64>,
    end_time: Option<i64>,
}

impl SessionRow {
    fn into_session(self) -> Result<Session, DbError> {
        let logical_date = parse_date(&self.logical_date, &self.id)?;
        let kind = self
            .kind
            .parse::<SessionKind>()
            .map_err(|_| DbError::InvalidRow {
                id: self.id.clone(),
                column: "type",
                value: self.kind.clone(),
            })?;
        Ok(Session {
            id: SessionId::new(self.id)?,
            logical_date,
            kind,
            title: self.title,
            created_at: self.created_at,
            start_time: self.start_time,
            end_time: self.end_time,
            total_elapsed_nanos: self.total_elapsed_nanos,
        })
    }
}

#[derive(Debug)]
struct RecordRow {
    id: String,
    session_id: String,
    seq_index: u32,
    wall_clock_time: i64,
    elapsed_nanos: i64,
    split_nanos: i64,
    note: String,
}

impl RecordRow {
    fn into_archived(self) -> Result<ArchivedRecord, DbError> {
        Ok(ArchivedRecord {
            session_id: SessionId::new(self.session_id)?,
            record: TimeRecord {
                id: RecordId::new(self.id)?,
                index: self.seq_index,
                wall_clock_millis: self.wall_clock_time,
                elapsed_nanos: self.elapsed_nanos,
                split_nanos: self.split_nanos,
                note: self.note,
            },
        })
    }
}

fn read_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        logical_date: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        created_at: row.get(4)?,
        total_elapsed_nanos: row.get(5)?,
        start_time: row.get(6)?,
        end_time: row.get(7)?,
    })
}

fn read_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: row.get(0)?,
        session_id: row.get(1)?,
        seq_index: row.get(2)?,
        wall_clock_time: row.get(3)?,
        elapsed_nanos: row.get(4)?,
        split_nanos: row.get(5)?,
        note: row.get(6)?,
    })
}

fn insert_session(conn: &Connection, session: &Session) -> Result<(), DbError> {
    conn.execute(
        &format!("INSERT INTO sessions ({SESSION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
        params![
            session.id.as_str(),
            format_date(session.logical_date),
            session.kind.as_str(),
            session.title,
            session.created_at,
            session.total_elapsed_nanos,
            session.start_time,
            session.end_time,
        ],
    )?;
    Ok(())
}

/// Inserts records for a session.
///
/// With `first_index` the records are renumbered consecutively from it;
/// otherwise each keeps its own index.
fn insert_records(
    conn: &Connection,
    session_id: &SessionId,
    records: &[TimeRecord],
    first_index: Option<u32>,
) -> Result<Vec<TimeRecord>, DbError> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO records ({RECORD_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
    ))?;
    let mut stored = Vec::with_capacity(records.len());
    for (offset, record) in records.iter().enumerate() {
        let mut record = record.clone();
        if let Some(first) = first_index {
            record.index = first + u32::try_from(offset).unwrap_or(u32::MAX);
        }
        stmt.execute(params![
            record.id.as_str(),
            session_id.as_str(),
            record.index,
            record.wall_clock_millis,
            record.elapsed_nanos,
            record.split_nanos,
            record.note,
        ])?;
        stored.push(record);
    }
    Ok(stored)
}

fn find_event_session(conn: &Connection, date: NaiveDate) -> Result<Option<Session>, DbError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE logical_date = ? AND type = 'event'"
            ),
            [format_date(date)],
            read_session_row,
        )
        .optional()?;
    row.map(SessionRow::into_session).transpose()
}

/// Renumbers a session's records by wall-clock order and recomputes splits.
fn resequence(conn: &Connection, session_id: &str) -> Result<(), DbError> {
    let kind: Option<String> = conn
        .query_row(
            "SELECT type FROM sessions WHERE id = ?",
            [session_id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(kind) = kind else {
        return Ok(());
    };
    let basis = SplitBasis::from(kind.parse::<SessionKind>().map_err(|_| {
        DbError::InvalidRow {
            id: session_id.to_string(),
            column: "type",
            value: kind.clone(),
        }
    })?);

    let session_id = SessionId::new(session_id)?;
    let records: Vec<TimeRecord> = {
        let mut stmt = conn.prepare(&format!(
            "
            SELECT {RECORD_COLUMNS}
            FROM records
            WHERE session_id = ?
            ORDER BY wall_clock_time ASC, seq_index ASC
            "
        ))?;
        let rows = stmt.query_map([session_id.as_str()], read_record_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_archived()?.record);
        }
        records
    };

    let mut stmt =
        conn.prepare("UPDATE records SET seq_index = ?, split_nanos = ? WHERE id = ?")?;
    let mut previous: Option<&TimeRecord> = None;
    for (pos, record) in records.iter().enumerate() {
        let index = u32::try_from(pos + 1).unwrap_or(u32::MAX);
        let split = basis.split(previous, record);
        if index != record.index || split != record.split_nanos {
            stmt.execute(params![index, split, record.id.as_str()])?;
        }
        previous = Some(record);
    }
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str, id: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DbError::InvalidRow {
        id: id.to_string(),
        column: "logical_date",
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(index: u32, wall: i64, elapsed: i64, split: i64) -> TimeRecord {
        TimeRecord {
            id: RecordId::generate(),
            index,
            wall_clock_millis: wall,
            elapsed_nanos: elapsed,
            split_nanos: split,
            note: String::new(),
        }
    }

    fn stopwatch_session(day: NaiveDate, created_at: i64) -> Session {
        Session {
            id: SessionId::generate(),
            logical_date: day,
            kind: SessionKind::Stopwatch,
            title: "Run".to_string(),
            created_at,
            start_time: Some(created_at),
            end_time: Some(created_at + 1_000),
            total_elapsed_nanos: Some(1_000_000_000),
        }
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn open_on_disk_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("markbook.db");
        {
            let mut db = Database::open(&path).unwrap();
            let session = stopwatch_session(date(2025, 1, 1), 1);
            db.archive_session(&session, &[record(1, 1, 0, 0)]).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.stats().unwrap().sessions, 1);
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");

        assert_eq!(
            table_columns(&db.conn, "sessions"),
            vec![
                "id",
                "logical_date",
                "type",
                "title",
                "created_at",
                "total_elapsed_nanos",
                "start_time",
                "end_time",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "records"),
            vec![
                "id",
                "session_id",
                "seq_index",
                "wall_clock_time",
                "elapsed_nanos",
                "split_nanos",
                "note",
            ]
        );

        let session_indexes = index_names(&db.conn, "sessions");
        assert!(session_indexes.contains("idx_sessions_date_type"));
        assert!(session_indexes.contains("idx_sessions_event_day"));
        assert!(index_names(&db.conn, "records").contains("idx_records_session"));

        let records_foreign_keys = foreign_keys(&db.conn, "records");
        assert_eq!(
            records_foreign_keys,
            vec![(
                "sessions".to_string(),
                "session_id".to_string(),
                "id".to_string(),
                "CASCADE".to_string(),
            )]
        );
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    fn foreign_keys(conn: &Connection, table: &str) -> Vec<(String, String, String, String)> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA foreign_key_list({table})"))
            .expect("prepare foreign_key_list");
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .expect("query foreign_key_list");
        rows.map(|row| row.expect("foreign_key_list row")).collect()
    }

    #[test]
    fn archive_session_round_trips_through_queries() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        let session = stopwatch_session(day, 100);
        let records = [record(1, 100, 500, 0), record(2, 200, 900, 400)];
        db.archive_session(&session, &records).unwrap();

        let sessions = db.list_sessions(day, SessionKind::Stopwatch).unwrap();
        assert_eq!(sessions, vec![session.clone()]);
        let stored = db.list_records(&session.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].record, records[0]);
        assert_eq!(stored[1].session_id, session.id);
    }

    #[test]
    fn archive_empty_list_creates_nothing() {
        let mut db = Database::open_in_memory().unwrap();
        let session = stopwatch_session(date(2025, 4, 2), 1);
        let err = db.archive_session(&session, &[]).unwrap_err();
        assert!(matches!(err, DbError::EmptyArchive));
        assert_eq!(count(&db, "sessions"), 0);
    }

    #[test]
    fn failed_record_insert_rolls_back_session() {
        let mut db = Database::open_in_memory().unwrap();
        let session = stopwatch_session(date(2025, 4, 2), 1);
        let duplicate = record(1, 1, 0, 0);
        let err = db
            .archive_session(&session, &[duplicate.clone(), duplicate])
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert_eq!(count(&db, "sessions"), 0);
        assert_eq!(count(&db, "records"), 0);
    }

    #[test]
    fn records_cannot_reference_missing_session() {
        let db = Database::open_in_memory().unwrap();
        let missing = SessionId::new("missing").unwrap();
        let result = insert_records(&db.conn, &missing, &[record(1, 1, 0, 0)], None);
        assert!(result.is_err());
        assert_eq!(count(&db, "records"), 0);
    }

    #[test]
    fn event_day_session_is_created_once_and_reused() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        let (first, stored) = db
            .append_to_event_day(day, 10, &[record(1, 10, 0, 0)])
            .unwrap();
        let (second, stored_again) = db
            .append_to_event_day(day, 20, &[record(1, 20, 0, 10_000_000)])
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(stored[0].index, 1);
        assert_eq!(stored_again[0].index, 2);
        assert_eq!(db.list_sessions(day, SessionKind::Event).unwrap().len(), 1);
        assert_eq!(db.list_records(&first.id).unwrap().len(), 2);
    }

    #[test]
    fn second_event_session_for_same_day_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        db.append_to_event_day(day, 10, &[record(1, 10, 0, 0)])
            .unwrap();
        let result = insert_session(&db.conn, &Session::event(day, 20));
        assert!(result.is_err());
    }

    #[test]
    fn stopwatch_sessions_allow_many_per_day() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        for created_at in [30, 10, 20] {
            let session = stopwatch_session(day, created_at);
            db.archive_session(&session, &[record(1, created_at, 0, 0)])
                .unwrap();
        }
        let created: Vec<i64> = db
            .list_sessions(day, SessionKind::Stopwatch)
            .unwrap()
            .iter()
            .map(|s| s.created_at)
            .collect();
        assert_eq!(created, vec![10, 20, 30]);
    }

    #[test]
    fn records_are_listed_by_wall_clock_time() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        let (session, _) = db
            .append_to_event_day(day, 0, &[record(1, 500, 0, 0)])
            .unwrap();
        db.append_to_event_day(day, 0, &[record(1, 100, 0, 0)])
            .unwrap();

        let walls: Vec<i64> = db
            .list_records(&session.id)
            .unwrap()
            .iter()
            .map(|r| r.record.wall_clock_millis)
            .collect();
        assert_eq!(walls, vec![100, 500]);
    }

    #[test]
    fn late_append_is_numbered_chronologically() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        let (session, _) = db
            .append_to_event_day(day, 0, &[record(1, 500, 0, 0)])
            .unwrap();
        let (_, stored) = db
            .append_to_event_day(day, 0, &[record(1, 100, 0, 0)])
            .unwrap();
        assert_eq!(stored[0].index, 1);
        assert_eq!(stored[0].split_nanos, 0);

        let listed: Vec<(i64, u32, i64)> = db
            .list_records(&session.id)
            .unwrap()
            .iter()
            .map(|r| (r.record.wall_clock_millis, r.record.index, r.record.split_nanos))
            .collect();
        assert_eq!(listed, vec![(100, 1, 0), (500, 2, 400_000_000)]);
    }

    #[test]
    fn deleting_session_cascades_to_records() {
        let mut db = Database::open_in_memory().unwrap();
        let session = stopwatch_session(date(2025, 4, 2), 1);
        db.archive_session(&session, &[record(1, 1, 0, 0), record(2, 2, 5, 5)])
            .unwrap();

        assert!(db.delete_session(&session.id).unwrap());
        assert!(db.list_records(&session.id).unwrap().is_empty());
        assert_eq!(count(&db, "records"), 0);
        assert!(!db.delete_session(&session.id).unwrap());
    }

    #[test]
    fn deleting_record_renumbers_and_recomputes_splits() {
        let mut db = Database::open_in_memory().unwrap();
        let session = stopwatch_session(date(2025, 4, 2), 1);
        let records = [
            record(1, 10, 100, 0),
            record(2, 20, 200, 100),
            record(3, 30, 300, 100),
            record(4, 40, 400, 100),
        ];
        db.archive_session(&session, &records).unwrap();

        assert!(db.delete_record(&records[1].id).unwrap());
        let stored: Vec<(u32, i64, i64)> = db
            .list_records(&session.id)
            .unwrap()
            .iter()
            .map(|r| (r.record.index, r.record.elapsed_nanos, r.record.split_nanos))
            .collect();
        assert_eq!(stored, vec![(1, 100, 0), (2, 300, 200), (3, 400, 100)]);
    }

    #[test]
    fn deleting_unknown_record_is_noop() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(!db.delete_record(&RecordId::generate()).unwrap());
    }

    #[test]
    fn rename_validates_against_kind() {
        let mut db = Database::open_in_memory().unwrap();
        let session = stopwatch_session(date(2025, 4, 2), 1);
        db.archive_session(&session, &[record(1, 1, 0, 0)]).unwrap();

        assert!(db.rename_session(&session.id, "Intervals").unwrap());
        assert_eq!(
            db.get_session(&session.id).unwrap().unwrap().title,
            "Intervals"
        );
        assert!(matches!(
            db.rename_session(&session.id, "  "),
            Err(DbError::Validation(_))
        ));

        let (event, _) = db
            .append_to_event_day(date(2025, 4, 2), 1, &[record(1, 1, 0, 0)])
            .unwrap();
        assert!(db.rename_session(&event.id, "nope").is_err());
        assert!(!db.rename_session(&SessionId::generate(), "x").unwrap());
    }

    #[test]
    fn set_record_note_updates_row() {
        let mut db = Database::open_in_memory().unwrap();
        let session = stopwatch_session(date(2025, 4, 2), 1);
        let rec = record(1, 1, 0, 0);
        db.archive_session(&session, std::slice::from_ref(&rec))
            .unwrap();

        assert!(db.set_record_note(&rec.id, "felt good").unwrap());
        assert_eq!(db.list_records(&session.id).unwrap()[0].record.note, "felt good");
        assert!(!db.set_record_note(&RecordId::generate(), "x").unwrap());
    }

    #[test]
    fn delete_sessions_before_is_strict() {
        let mut db = Database::open_in_memory().unwrap();
        for day in [date(2025, 4, 1), date(2025, 4, 2), date(2025, 4, 3)] {
            db.append_to_event_day(day, 0, &[record(1, 0, 0, 0)]).unwrap();
        }
        assert_eq!(db.delete_sessions_before(date(2025, 4, 2)).unwrap(), 1);
        assert_eq!(
            db.logical_dates(SessionKind::Event).unwrap(),
            vec![date(2025, 4, 2), date(2025, 4, 3)]
        );
        assert_eq!(count(&db, "records"), 2);
    }

    #[test]
    fn empty_event_sessions_are_removed_but_stopwatch_kept() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        let (event, stored) = db
            .append_to_event_day(day, 0, &[record(1, 0, 0, 0)])
            .unwrap();
        let sw = stopwatch_session(day, 5);
        let sw_record = record(1, 5, 0, 0);
        db.archive_session(&sw, std::slice::from_ref(&sw_record))
            .unwrap();

        db.delete_record(&stored[0].id).unwrap();
        db.delete_record(&sw_record.id).unwrap();

        assert_eq!(db.delete_empty_event_sessions().unwrap(), 1);
        assert!(db.get_session(&event.id).unwrap().is_none());
        assert!(db.get_session(&sw.id).unwrap().is_some());
    }

    #[test]
    fn logical_dates_are_distinct_per_kind() {
        let mut db = Database::open_in_memory().unwrap();
        let day = date(2025, 4, 2);
        db.archive_session(&stopwatch_session(day, 1), &[record(1, 1, 0, 0)])
            .unwrap();
        db.archive_session(&stopwatch_session(day, 2), &[record(1, 2, 0, 0)])
            .unwrap();
        db.append_to_event_day(date(2025, 4, 5), 0, &[record(1, 0, 0, 0)])
            .unwrap();

        assert_eq!(db.logical_dates(SessionKind::Stopwatch).unwrap(), vec![day]);
        assert_eq!(
            db.logical_dates(SessionKind::Event).unwrap(),
            vec![date(2025, 4, 5)]
        );
    }

    #[test]
    fn latest_session_prefers_newest_date() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(db.latest_session(SessionKind::Event).unwrap().is_none());
        db.append_to_event_day(date(2025, 4, 5), 0, &[record(1, 0, 0, 0)])
            .unwrap();
        db.append_to_event_day(date(2025, 4, 2), 9, &[record(1, 9, 0, 0)])
            .unwrap();
        let latest = db.latest_session(SessionKind::Event).unwrap().unwrap();
        assert_eq!(latest.logical_date, date(2025, 4, 5));
    }

    #[test]
    fn stats_counts_rows_and_date_span() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(db.stats().unwrap(), StoreStats::default());
        db.append_to_event_day(date(2025, 4, 5), 0, &[record(1, 0, 0, 0), record(2, 1, 0, 0)])
            .unwrap();
        db.append_to_event_day(date(2025, 4, 2), 0, &[record(1, 0, 0, 0)])
            .unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.first_date, Some(date(2025, 4, 2)));
        assert_eq!(stats.last_date, Some(date(2025, 4, 5)));
    }
}
