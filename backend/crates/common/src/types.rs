use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub instance_id: Uuid,
}

impl ServiceInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            instance_id: Uuid::new_v4(),
        }
    }
}

/// Direction of a check-in as understood by the HR system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    In,
    Out,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::In => "IN",
            LogType::Out => "OUT",
        }
    }
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One door event, ready to be submitted as an employee check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_field_value: String,
    pub timestamp: DateTime<FixedOffset>,
    pub log_type: LogType,
}

impl AttendanceRecord {
    /// Key under which a forwarded record is written to the processed-entry ledger.
    pub fn ledger_key(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ts: &str) -> AttendanceRecord {
        AttendanceRecord {
            employee_field_value: "EMP-001".to_string(),
            timestamp: DateTime::parse_from_rfc3339(ts).unwrap(),
            log_type: LogType::In,
        }
    }

    #[test]
    fn log_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&LogType::In).unwrap(), "\"IN\"");
        assert_eq!(serde_json::to_string(&LogType::Out).unwrap(), "\"OUT\"");
        let parsed: LogType = serde_json::from_str("\"OUT\"").unwrap();
        assert_eq!(parsed, LogType::Out);
    }

    #[test]
    fn log_type_display_matches_wire_value() {
        assert_eq!(LogType::In.to_string(), "IN");
        assert_eq!(LogType::Out.to_string(), "OUT");
    }

    #[test]
    fn ledger_key_keeps_offset_and_second_precision() {
        let r = record("2024-07-01T09:15:30+05:30");
        assert_eq!(r.ledger_key(), "2024-07-01T09:15:30+05:30");
    }

    #[test]
    fn service_info_carries_crate_version() {
        let info = ServiceInfo::new("attendance-sync");
        assert_eq!(info.name, "attendance-sync");
        assert!(!info.version.is_empty());
    }
}
