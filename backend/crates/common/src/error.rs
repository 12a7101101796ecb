use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AttendanceError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_become_storage_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only filesystem");
        let err: AttendanceError = io.into();
        assert!(matches!(err, AttendanceError::Storage(_)));
        assert_eq!(err.to_string(), "storage error: read-only filesystem");
    }

    #[test]
    fn config_errors_name_the_problem() {
        let err = AttendanceError::Config("IMPORT_START_DATE is required but not set".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: IMPORT_START_DATE is required but not set"
        );
    }
}
