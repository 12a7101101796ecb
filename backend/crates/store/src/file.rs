use std::io::Write;
use std::path::Path;

use attendance_common::error::{AttendanceError, AttendanceResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

/// Read a JSON document. Returns `None` when the file does not exist yet.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> AttendanceResult<Option<T>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AttendanceError::Storage(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    // An interrupted first write can leave a zero-length file behind.
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&raw).map(Some).map_err(|e| {
        AttendanceError::Serialization(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a JSON document via a temp file in the same directory, then rename
/// it over the target. Readers see either the old or the new document.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> AttendanceResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let body = serde_json::to_vec_pretty(value)
        .map_err(|e| AttendanceError::Serialization(e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        AttendanceError::Storage(format!("failed to replace {}: {}", path.display(), e.error))
    })?;

    Ok(())
}
