use attendance_common::error::AttendanceResult;

/// Append-only audit trail of records accepted by the HR system, keyed by
/// event timestamp. Not consulted for deduplication.
pub trait LedgerRepository: Send + Sync {
    /// Mark the entry as successfully forwarded and flush to storage.
    fn record_success(&self, key: &str) -> AttendanceResult<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
