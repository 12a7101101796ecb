use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Resumption state for the device poller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    /// Latest device event time that has been fetched and processed.
    pub latest_fetched_time: Option<DateTime<FixedOffset>>,
    /// When the log files were last truncated.
    pub last_cleared: DateTime<Utc>,
}

impl SyncCheckpoint {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            latest_fetched_time: None,
            last_cleared: now,
        }
    }
}
