use attendance_common::error::{AttendanceError, AttendanceResult};
use chrono::NaiveDate;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::tracing_init::{ERROR_LOG_FILE, INFO_LOG_FILE};

const CHECKPOINT_FILE: &str = "status.json";
const LEDGER_FILE: &str = "processed_entries.json";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logs_directory: PathBuf,
    pub log_level: String,
    pub sync_interval_secs: u64,
    pub log_clear_interval_days: u32,
    pub import_start_date: NaiveDate,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads required vars.
    pub fn from_env() -> AttendanceResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let raw_start = get_var("IMPORT_START_DATE")?;
        let import_start_date = NaiveDate::parse_from_str(&raw_start, "%Y%m%d").map_err(|e| {
            AttendanceError::Config(format!(
                "invalid IMPORT_START_DATE {raw_start:?} (expected YYYYMMDD): {e}"
            ))
        })?;

        Ok(Self {
            logs_directory: PathBuf::from(get_var_or("LOGS_DIRECTORY", "./logs")),
            log_level: get_var_or("LOG_LEVEL", "info"),
            sync_interval_secs: parse_var_or("SYNC_INTERVAL_SECS", 15)?,
            log_clear_interval_days: parse_var_or("LOG_CLEAR_INTERVAL_DAYS", 30)?,
            import_start_date,
        })
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.logs_directory.join(CHECKPOINT_FILE)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.logs_directory.join(LEDGER_FILE)
    }

    pub fn log_files(&self) -> Vec<PathBuf> {
        vec![
            self.logs_directory.join(INFO_LOG_FILE),
            self.logs_directory.join(ERROR_LOG_FILE),
        ]
    }
}

/// Read a required variable.
pub fn get_var(key: &str) -> AttendanceResult<String> {
    env::var(key).map_err(|_| AttendanceError::Config(format!("{key} is required but not set")))
}

pub fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Read and parse an optional variable. A value that is present but does not
/// parse is a configuration error rather than a silent fallback.
pub fn parse_var_or<T>(key: &str, default: T) -> AttendanceResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AttendanceError::Config(format!("invalid {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear() {
        for key in [
            "IMPORT_START_DATE",
            "LOGS_DIRECTORY",
            "LOG_LEVEL",
            "SYNC_INTERVAL_SECS",
            "LOG_CLEAR_INTERVAL_DAYS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn config_from_env_succeeds_with_required_vars() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();

        env::set_var("IMPORT_START_DATE", "20240701");

        let cfg = AppConfig::from_env().expect("should parse config");
        assert_eq!(
            cfg.import_start_date,
            NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
        );
        assert_eq!(cfg.sync_interval_secs, 15);
        assert_eq!(cfg.log_clear_interval_days, 30);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.logs_directory, PathBuf::from("./logs"));

        clear();
    }

    #[test]
    fn config_from_env_fails_without_import_start_date() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();

        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("IMPORT_START_DATE"), "got: {err}");
    }

    #[test]
    fn config_from_env_rejects_malformed_date() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();

        env::set_var("IMPORT_START_DATE", "2024-07-01");
        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, AttendanceError::Config(_)));

        clear();
    }

    #[test]
    fn config_from_env_rejects_non_numeric_interval() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();

        env::set_var("IMPORT_START_DATE", "20240701");
        env::set_var("SYNC_INTERVAL_SECS", "soon");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("SYNC_INTERVAL_SECS"), "got: {err}");

        clear();
    }

    #[test]
    fn state_and_log_paths_live_in_logs_directory() {
        let cfg = AppConfig {
            logs_directory: PathBuf::from("/var/lib/attendance"),
            log_level: "debug".to_owned(),
            sync_interval_secs: 60,
            log_clear_interval_days: 30,
            import_start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(
            cfg.checkpoint_path(),
            PathBuf::from("/var/lib/attendance/status.json")
        );
        assert_eq!(
            cfg.ledger_path(),
            PathBuf::from("/var/lib/attendance/processed_entries.json")
        );
        assert_eq!(
            cfg.log_files(),
            vec![
                PathBuf::from("/var/lib/attendance/logs.log"),
                PathBuf::from("/var/lib/attendance/error.log"),
            ]
        );
        assert_eq!(cfg.sync_interval(), Duration::from_secs(60));
    }
}
