use chrono::{DateTime, Utc};

use crate::checkpoint::models::SyncCheckpoint;
use attendance_common::error::AttendanceResult;

pub trait CheckpointRepository: Send + Sync {
    /// Load the persisted checkpoint, or `None` on first run.
    fn load(&self) -> AttendanceResult<Option<SyncCheckpoint>>;

    /// Persist the checkpoint. Must be durable when this returns.
    fn save(&self, checkpoint: &SyncCheckpoint) -> AttendanceResult<()>;

    /// Load the checkpoint, creating and persisting a fresh one stamped with
    /// `now` if none exists.
    fn get_or_create(&self, now: DateTime<Utc>) -> AttendanceResult<SyncCheckpoint> {
        if let Some(existing) = self.load()? {
            return Ok(existing);
        }
        let fresh = SyncCheckpoint::new(now);
        self.save(&fresh)?;
        Ok(fresh)
    }
}
