//! Core domain logic for markbook.
//!
//! This crate contains the fundamental types and logic for:
//! - Clocks: separate monotonic and wall-clock sources
//! - Live capture: the stopwatch state machine and event marks
//! - Archive policy: logical-day assignment and retention cutoffs
//! - Display: duration/timestamp formatting and periodic tickers

pub mod capture;
pub mod clock;
pub mod cursor;
pub mod event_log;
pub mod format;
pub mod policy;
pub mod record;
pub mod session;
pub mod stopwatch;
pub mod ticker;
pub mod types;

pub use capture::StopwatchCapture;
pub use clock::{
    ManualMonotonicClock, ManualWallClock, MonotonicClock, SystemMonotonicClock, SystemWallClock,
    WallClock,
};
pub use cursor::SessionCursor;
pub use event_log::EventRecorder;
pub use policy::{ArchivePolicy, ArchiveSettings, DayBoundary, PolicyError, retention_cutoff};
pub use record::{MarkList, SplitBasis, TimeRecord};
pub use session::{ArchivedRecord, Session, validate_title};
pub use stopwatch::{CompletedRun, Stopwatch, StopwatchCommand, StopwatchStatus, transition};
pub use types::{RecordId, SessionId, SessionKind, ValidationError};
