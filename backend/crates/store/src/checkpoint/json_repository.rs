use std::path::PathBuf;

use crate::checkpoint::models::SyncCheckpoint;
use crate::checkpoint::repositories::CheckpointRepository;
use crate::file::{read_json, write_json_atomic};
use attendance_common::error::AttendanceResult;

#[derive(Debug, Clone)]
pub struct JsonCheckpointRepository {
    path: PathBuf,
}

impl JsonCheckpointRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CheckpointRepository for JsonCheckpointRepository {
    fn load(&self) -> AttendanceResult<Option<SyncCheckpoint>> {
        read_json(&self.path)
    }

    fn save(&self, checkpoint: &SyncCheckpoint) -> AttendanceResult<()> {
        write_json_atomic(&self.path, checkpoint)?;
        tracing::debug!(
            path = %self.path.display(),
            latest_fetched_time = ?checkpoint.latest_fetched_time,
            "checkpoint saved"
        );
        Ok(())
    }
}
