use attendance_common::types::{AttendanceRecord, LogType};
use chrono::{DateTime, FixedOffset, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Offset the door controller reports local time in (UTC+05:30).
pub const DEVICE_UTC_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Check-ins at or before this local time are `IN`, later ones `OUT`.
pub const MIDDAY_CUTOFF: (u32, u32, u32) = (13, 30, 0);

const DEVICE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%:z"];

pub fn device_offset() -> FixedOffset {
    FixedOffset::east_opt(DEVICE_UTC_OFFSET_SECS).expect("device offset is within range")
}

/// Format a timestamp the way the event API expects window bounds,
/// e.g. `2024-07-01T00:00:00+05:30`.
pub fn format_device_time(ts: &DateTime<FixedOffset>) -> String {
    ts.with_timezone(&device_offset())
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Parse a `deviceTime` value carrying an explicit UTC offset.
pub fn parse_device_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DEVICE_TIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok())
}

/// Midday split evaluated in device-local time.
pub fn classify_log_type(ts: &DateTime<FixedOffset>) -> LogType {
    let (h, m, s) = MIDDAY_CUTOFF;
    let cutoff = NaiveTime::from_hms_opt(h, m, s).expect("cutoff is a valid time");
    if ts.with_timezone(&device_offset()).time() <= cutoff {
        LogType::In
    } else {
        LogType::Out
    }
}

/// Request body for `POST /artemis/api/acs/v1/door/events`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorEventQuery {
    pub start_time: String,
    pub end_time: String,
    pub event_type: u32,
    pub door_index_codes: Vec<String>,
    pub page_no: u32,
    pub page_size: u32,
    pub temperature_status: i32,
    pub mask_status: i32,
    pub order_type: i32,
}

/// Response envelope. `data` and `data.list` are both optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoorEventResponse {
    #[serde(default)]
    pub data: Option<DoorEventPage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoorEventPage {
    #[serde(default)]
    pub list: Option<Vec<DoorEvent>>,
}

impl DoorEventResponse {
    pub fn into_events(self) -> Vec<DoorEvent> {
        self.data.and_then(|d| d.list).unwrap_or_default()
    }
}

/// A single door event. Only the fields the relay needs are modelled.
///
/// Both fields are kept loose so one malformed event cannot fail the whole
/// page; `to_record` decides whether the event is usable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorEvent {
    #[serde(default, deserialize_with = "string_or_number")]
    pub person_id: Option<String>,
    #[serde(default)]
    pub device_time: Option<serde_json::Value>,
}

/// Why an event was dropped instead of becoming a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEvent {
    #[error("missing personId")]
    MissingPersonId,

    #[error("missing deviceTime")]
    MissingDeviceTime,

    #[error("unparsable deviceTime {0}")]
    UnparsableDeviceTime(String),
}

impl DoorEvent {
    /// Convert into an attendance record, or explain why it was dropped.
    pub fn to_record(&self) -> Result<AttendanceRecord, InvalidEvent> {
        let employee = self
            .person_id
            .as_deref()
            .ok_or(InvalidEvent::MissingPersonId)?;
        let timestamp = match &self.device_time {
            None | Some(serde_json::Value::Null) => return Err(InvalidEvent::MissingDeviceTime),
            Some(serde_json::Value::String(raw)) => parse_device_time(raw)
                .ok_or_else(|| InvalidEvent::UnparsableDeviceTime(format!("{raw:?}")))?,
            Some(other) => return Err(InvalidEvent::UnparsableDeviceTime(other.to_string())),
        };

        Ok(AttendanceRecord {
            employee_field_value: employee.to_string(),
            timestamp,
            log_type: classify_log_type(&timestamp),
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
