use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::file::{read_json, write_json_atomic};
use crate::ledger::repositories::LedgerRepository;
use attendance_common::error::{AttendanceError, AttendanceResult};

/// Ledger held in memory and rewritten in full after every insert.
#[derive(Debug)]
pub struct JsonLedgerRepository {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, bool>>,
}

impl JsonLedgerRepository {
    /// Open the ledger at `path`, loading any existing entries.
    pub fn open(path: impl Into<PathBuf>) -> AttendanceResult<Self> {
        let path = path.into();
        let entries = read_json(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[cfg(test)]
    fn path(&self) -> &std::path::Path {
        &self.path
    }

    #[cfg(test)]
    fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

impl LedgerRepository for JsonLedgerRepository {
    fn record_success(&self, key: &str) -> AttendanceResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AttendanceError::Internal("ledger lock poisoned".to_string()))?;
        entries.insert(key.to_string(), true);
        write_json_atomic(&self.path, &*entries)
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }
}
