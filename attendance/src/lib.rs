//! Attendance decisions over a fixed window.
//!
//! Instantaneous presence labels are bucketed between periodic samples; each
//! sample is the strict majority of its bucket, and the window verdict is the
//! strict majority of its samples. Ties resolve to absent.

pub mod error;
pub mod recorder;
pub mod sampler;
pub mod vote;

pub use error::AttendanceError;
pub use recorder::{
    AttendanceRecord, AttendanceRecorder, HttpAttendanceRecorder, RecordOutcome, SkipReason,
};
pub use sampler::{AttendanceSampler, PresenceSample, SamplerEvent};
pub use vote::{majority, Tally};
