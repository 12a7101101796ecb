use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use attendance_common::error::AttendanceResult;
use attendance_store::checkpoint::repositories::CheckpointRepository;
use chrono::{DateTime, Duration, Utc};

use crate::cursor::TimeWindowCursor;

/// Periodic in-place truncation of the service log files.
///
/// The appenders hold the files open in append mode, so truncating to zero
/// length is enough for new lines to start at the top again.
#[derive(Debug, Clone)]
pub struct LogMaintenance {
    log_files: Vec<PathBuf>,
    interval: Duration,
}

impl LogMaintenance {
    pub fn new(log_files: Vec<PathBuf>, interval_days: u32) -> Self {
        Self {
            log_files,
            interval: Duration::days(i64::from(interval_days)),
        }
    }

    pub fn is_due(&self, last_cleared: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - last_cleared >= self.interval
    }

    /// Truncate the log files if the interval has elapsed since the stored
    /// `last_cleared`, then persist `now` as the new value.
    pub fn run_if_due<C>(&self, cursor: &mut TimeWindowCursor<C>, now: DateTime<Utc>) -> AttendanceResult<bool>
    where
        C: CheckpointRepository,
    {
        if !self.is_due(cursor.last_cleared(), now) {
            return Ok(false);
        }

        for path in &self.log_files {
            truncate(path)?;
        }
        cursor.mark_cleared(now)?;

        tracing::info!(
            files = self.log_files.len(),
            last_cleared = %now,
            "log files cleared"
        );
        Ok(true)
    }
}

fn truncate(path: &Path) -> io::Result<()> {
    match OpenOptions::new().write(true).open(path) {
        Ok(file) => file.set_len(0),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
