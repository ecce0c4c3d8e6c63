//! Event marks: wall-clock-stamped, no elapsed time and no pause.

use chrono::NaiveDate;

use crate::clock::WallClock;
use crate::record::{MarkList, SplitBasis, TimeRecord};
use crate::types::RecordId;

/// Live sequence of event marks for one logical day.
#[derive(Debug, Clone)]
pub struct EventRecorder<W: WallClock> {
    wall: W,
    marks: MarkList,
    logical_date: Option<NaiveDate>,
}

impl<W: WallClock> EventRecorder<W> {
    pub const fn new(wall: W) -> Self {
        Self {
            wall,
            marks: MarkList::new(SplitBasis::WallClock),
            logical_date: None,
        }
    }

    /// Appends a mark stamped with the current wall-clock time.
    pub fn record_event(&mut self, note: impl Into<String>) -> &TimeRecord {
        let now = self.wall.now_millis();
        let record = self.marks.push(now, 0, note.into());
        tracing::debug!(index = record.index, split_nanos = record.split_nanos, "event recorded");
        record
    }

    pub const fn marks(&self) -> &MarkList {
        &self.marks
    }

    /// Logical day the live sequence belongs to, once known.
    pub const fn logical_date(&self) -> Option<NaiveDate> {
        self.logical_date
    }

    pub fn reset(&mut self) {
        self.marks.clear();
        self.logical_date = None;
    }

    pub fn delete(&mut self, id: &RecordId) -> Option<TimeRecord> {
        self.marks.remove(id)
    }

    pub fn delete_at(&mut self, index: u32) -> Option<TimeRecord> {
        self.marks.remove_index(index)
    }

    pub fn set_note(&mut self, id: &RecordId, note: impl Into<String>) -> bool {
        self.marks.set_note(id, note)
    }

    /// Continues a sequence captured earlier, e.g. by a previous process.
    pub fn restore(&mut self, logical_date: NaiveDate, records: Vec<TimeRecord>) {
        self.marks.restore(records);
        self.logical_date = Some(logical_date);
    }

    /// Moves the live sequence to `today`.
    ///
    /// If the sequence belongs to an earlier logical day its marks are
    /// drained and returned, oldest first, so the caller can make sure they
    /// are archived. The live view then starts empty.
    pub fn roll_over(&mut self, today: NaiveDate) -> Vec<TimeRecord> {
        let previous = self.logical_date.replace(today);
        match previous {
            Some(day) if day != today && !self.marks.is_empty() => {
                tracing::info!(
                    %day,
                    %today,
                    count = self.marks.len(),
                    "event sequence rolled over"
                );
                self.marks.take_chronological()
            }
            _ => Vec::new(),
        }
    }
}
