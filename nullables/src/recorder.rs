//! Nullable attendance store.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use proxima_attendance::{
    AttendanceError, AttendanceRecord, AttendanceRecorder, RecordOutcome, SkipReason,
};

#[derive(Debug)]
struct Inner {
    records: Vec<AttendanceRecord>,
    answer: Result<RecordOutcome, AttendanceError>,
}

/// Keeps every record in memory. Clones share the same store.
#[derive(Clone, Debug)]
pub struct NullRecorder {
    inner: Arc<Mutex<Inner>>,
}

impl NullRecorder {
    pub fn new() -> Self {
        Self::answering(Ok(RecordOutcome::Recorded))
    }

    /// Behaves like a recorder without credentials.
    pub fn without_credential() -> Self {
        Self::answering(Ok(RecordOutcome::Skipped(SkipReason::NoCredential)))
    }

    pub fn failing(error: AttendanceError) -> Self {
        Self::answering(Err(error))
    }

    fn answering(answer: Result<RecordOutcome, AttendanceError>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records: Vec::new(),
                answer,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every record submitted, including skipped and failed ones.
    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.lock().records.clone()
    }
}

impl Default for NullRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttendanceRecorder for NullRecorder {
    async fn record(&self, record: &AttendanceRecord) -> Result<RecordOutcome, AttendanceError> {
        let mut inner = self.lock();
        inner.records.push(record.clone());
        inner.answer.clone()
    }
}
