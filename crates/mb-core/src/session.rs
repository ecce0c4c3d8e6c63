//! Archived sessions and their records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::TimeRecord;
use crate::stopwatch::CompletedRun;
use crate::types::{SessionId, SessionKind, ValidationError};

/// A day-bucketed container of archived records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// The logical day this session belongs to.
    pub logical_date: NaiveDate,
    pub kind: SessionKind,
    /// Always empty for event sessions.
    #[serde(default)]
    pub title: String,
    /// Unix-epoch milliseconds.
    pub created_at: i64,

    // Stopwatch runs only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_elapsed_nanos: Option<i64>,
}

impl Session {
    /// A new, empty event session for `logical_date`.
    pub fn event(logical_date: NaiveDate, created_at: i64) -> Self {
        Self {
            id: SessionId::generate(),
            logical_date,
            kind: SessionKind::Event,
            title: String::new(),
            created_at,
            start_time: None,
            end_time: None,
            total_elapsed_nanos: None,
        }
    }

    /// A session describing a stopped stopwatch run.
    pub fn stopwatch(
        logical_date: NaiveDate,
        title: &str,
        run: &CompletedRun,
        created_at: i64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: SessionId::generate(),
            logical_date,
            kind: SessionKind::Stopwatch,
            title: validate_title(SessionKind::Stopwatch, title)?,
            created_at,
            start_time: Some(run.start_wall_millis),
            end_time: Some(run.end_wall_millis),
            total_elapsed_nanos: Some(run.total_elapsed_nanos),
        })
    }
}

/// Checks a title against the session kind and returns it trimmed.
///
/// Stopwatch titles must be non-empty; event sessions take no title.
pub fn validate_title(kind: SessionKind, title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    match kind {
        SessionKind::Stopwatch if title.is_empty() => {
            Err(ValidationError::Empty { field: "title" })
        }
        SessionKind::Stopwatch => Ok(title.to_string()),
        SessionKind::Event if title.is_empty() => Ok(String::new()),
        SessionKind::Event => Err(ValidationError::TitleNotAllowed),
    }
}

/// A record as stored, tied to its owning session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedRecord {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub record: TimeRecord,
}
