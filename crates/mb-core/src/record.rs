//! Live time marks and the newest-first list that owns them.

use serde::{Deserialize, Serialize};

use crate::types::{RecordId, SessionKind};

const NANOS_PER_MILLI: i64 = 1_000_000;

/// A single mark captured during live capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRecord {
    pub id: RecordId,
    /// 1-based position, 1 being the oldest mark of the sequence.
    pub index: u32,
    /// When the mark was made, in Unix-epoch milliseconds.
    pub wall_clock_millis: i64,
    /// Stopwatch elapsed time at the mark. Always 0 for event marks.
    pub elapsed_nanos: i64,
    /// Delta from the previous mark of the same sequence, 0 for the first.
    pub split_nanos: i64,
    #[serde(default)]
    pub note: String,
}

/// Which reading a split is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitBasis {
    /// Difference of stopwatch elapsed times.
    Elapsed,
    /// Difference of wall-clock timestamps.
    WallClock,
}

impl SplitBasis {
    /// Split of `current` measured against its predecessor.
    pub fn split(self, previous: Option<&TimeRecord>, current: &TimeRecord) -> i64 {
        let Some(previous) = previous else {
            return 0;
        };
        let delta = match self {
            Self::Elapsed => current.elapsed_nanos - previous.elapsed_nanos,
            Self::WallClock => (current.wall_clock_millis - previous.wall_clock_millis)
                .saturating_mul(NANOS_PER_MILLI),
        };
        delta.max(0)
    }
}

impl From<SessionKind> for SplitBasis {
    fn from(kind: SessionKind) -> Self {
        match kind {
            SessionKind::Event => Self::WallClock,
            SessionKind::Stopwatch => Self::Elapsed,
        }
    }
}

/// Ordered marks of one live sequence, stored newest first.
///
/// Index numbering is independent of storage order: the oldest mark is
/// always index 1 and indices stay dense after a deletion.
#[derive(Debug, Clone)]
pub struct MarkList {
    basis: SplitBasis,
    marks: Vec<TimeRecord>,
}

impl MarkList {
    pub const fn new(basis: SplitBasis) -> Self {
        Self {
            basis,
            marks: Vec::new(),
        }
    }

    /// Appends a new mark and returns it.
    pub fn push(
        &mut self,
        wall_clock_millis: i64,
        elapsed_nanos: i64,
        note: String,
    ) -> &TimeRecord {
        let index = u32::try_from(self.marks.len() + 1).unwrap_or(u32::MAX);
        let mut record = TimeRecord {
            id: RecordId::generate(),
            index,
            wall_clock_millis,
            elapsed_nanos,
            split_nanos: 0,
            note,
        };
        record.split_nanos = self.basis.split(self.marks.first(), &record);
        self.marks.insert(0, record);
        &self.marks[0]
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks in display order, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &TimeRecord> {
        self.marks.iter()
    }

    /// Marks oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &TimeRecord> {
        self.marks.iter().rev()
    }

    pub fn newest(&self) -> Option<&TimeRecord> {
        self.marks.first()
    }

    pub fn by_index(&self, index: u32) -> Option<&TimeRecord> {
        self.marks.iter().find(|mark| mark.index == index)
    }

    /// Removes a mark by id, renumbering the rest.
    ///
    /// The mark that followed the removed one gets its split recomputed
    /// against its new predecessor.
    pub fn remove(&mut self, id: &RecordId) -> Option<TimeRecord> {
        let pos = self.marks.iter().position(|mark| &mark.id == id)?;
        let removed = self.marks.remove(pos);
        if pos > 0 {
            let split = self.basis.split(self.marks.get(pos), &self.marks[pos - 1]);
            self.marks[pos - 1].split_nanos = split;
        }
        self.renumber();
        Some(removed)
    }

    /// Removes the mark currently numbered `index`.
    pub fn remove_index(&mut self, index: u32) -> Option<TimeRecord> {
        let id = self.by_index(index)?.id.clone();
        self.remove(&id)
    }

    /// Replaces a mark's note. Returns `false` if no mark has that id.
    pub fn set_note(&mut self, id: &RecordId, note: impl Into<String>) -> bool {
        match self.marks.iter_mut().find(|mark| &mark.id == id) {
            Some(mark) => {
                mark.note = note.into();
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    /// Replaces the contents with previously captured marks.
    pub fn restore(&mut self, mut records: Vec<TimeRecord>) {
        records.sort_by_key(|record| std::cmp::Reverse(record.index));
        self.marks = records;
    }

    /// Drains the list, returning marks oldest first.
    pub fn take_chronological(&mut self) -> Vec<TimeRecord> {
        let mut marks = std::mem::take(&mut self.marks);
        marks.reverse();
        marks
    }

    fn renumber(&mut self) {
        for (pos, mark) in self.marks.iter_mut().rev().enumerate() {
            mark.index = u32::try_from(pos + 1).unwrap_or(u32::MAX);
        }
    }
}
