//! Mapping of ERPNext rejection text onto the three ways a failed check-in is
//! handled. The remote API only offers free-form messages, so everything that
//! depends on their wording lives here.

use attendance_common::error::{AttendanceError, AttendanceResult};

pub const EMPLOYEE_NOT_FOUND_ERROR_MESSAGE: &str =
    "No Employee found for the given employee field value";
pub const EMPLOYEE_INACTIVE_ERROR_MESSAGE: &str =
    "Transactions cannot be created for an Inactive Employee";
pub const DUPLICATE_EMPLOYEE_CHECKIN_ERROR_MESSAGE: &str =
    "This employee already has a log with the same timestamp";

/// Known benign rejections, addressed by 1-based index from `ALLOWED_EXCEPTIONS`.
pub const KNOWN_ERRORS: [&str; 3] = [
    EMPLOYEE_NOT_FOUND_ERROR_MESSAGE,
    EMPLOYEE_INACTIVE_ERROR_MESSAGE,
    DUPLICATE_EMPLOYEE_CHECKIN_ERROR_MESSAGE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The check-in already exists. Expected whenever windows overlap.
    Duplicate,
    /// Known, non-actionable. Goes to the remote error log only.
    Allowlisted,
    /// Anything else. Needs operator attention.
    Unclassified,
}

pub fn classify(message: &str, allowlist: &[String]) -> ErrorClass {
    if message.contains(DUPLICATE_EMPLOYEE_CHECKIN_ERROR_MESSAGE) {
        ErrorClass::Duplicate
    } else if allowlist
        .iter()
        .any(|allowed| !allowed.is_empty() && message.contains(allowed.as_str()))
    {
        ErrorClass::Allowlisted
    } else {
        ErrorClass::Unclassified
    }
}

/// Parse `ALLOWED_EXCEPTIONS`, e.g. `"1,2"`, into the matching messages.
pub fn parse_allowlist(raw: &str) -> AttendanceResult<Vec<String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let index: usize = s.parse().map_err(|_| {
                AttendanceError::Config(format!("ALLOWED_EXCEPTIONS entry {s:?} is not a number"))
            })?;
            index
                .checked_sub(1)
                .and_then(|i| KNOWN_ERRORS.get(i))
                .map(|msg| (*msg).to_string())
                .ok_or_else(|| {
                    AttendanceError::Config(format!(
                        "ALLOWED_EXCEPTIONS entry {index} is out of range 1..={}",
                        KNOWN_ERRORS.len()
                    ))
                })
        })
        .collect()
}

/// Pull a human-readable message out of an ERPNext error response body.
///
/// Tries `exc` (JSON-encoded list of tracebacks; last `": "` segment of the
/// first one), then `_server_messages` (first `message`), then falls back to
/// the compact body. Non-JSON bodies are returned as-is.
pub fn extract_error_message(body: &str) -> String {
    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return body.trim().to_string(),
    };

    if let Some(msg) = json.get("exc").and_then(message_from_exc) {
        return msg;
    }

    if let Some(msg) = json.get("_server_messages").and_then(message_from_server_messages) {
        return msg;
    }

    json.to_string()
}

fn message_from_exc(exc: &serde_json::Value) -> Option<String> {
    let first = match exc {
        serde_json::Value::String(encoded) => {
            match serde_json::from_str::<Vec<String>>(encoded) {
                Ok(list) => list.into_iter().next()?,
                Err(_) => encoded.clone(),
            }
        }
        serde_json::Value::Array(items) => items.first()?.as_str()?.to_string(),
        _ => return None,
    };

    let msg = first.trim_end().rsplit(": ").next()?.trim();
    (!msg.is_empty()).then(|| msg.to_string())
}

fn message_from_server_messages(raw: &serde_json::Value) -> Option<String> {
    let list = match raw {
        serde_json::Value::String(encoded) => serde_json::from_str::<serde_json::Value>(encoded).ok()?,
        other => other.clone(),
    };

    let first = list.as_array()?.first()?;
    let entry = match first {
        serde_json::Value::String(encoded) => serde_json::from_str::<serde_json::Value>(encoded).ok()?,
        other => other.clone(),
    };

    entry
        .get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_known() -> Vec<String> {
        KNOWN_ERRORS.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn duplicate_wins_even_when_not_allowlisted() {
        assert_eq!(
            classify(DUPLICATE_EMPLOYEE_CHECKIN_ERROR_MESSAGE, &[]),
            ErrorClass::Duplicate
        );
        assert_eq!(
            classify(DUPLICATE_EMPLOYEE_CHECKIN_ERROR_MESSAGE, &all_known()),
            ErrorClass::Duplicate
        );
    }

    #[test]
    fn allowlisted_messages_match_by_substring() {
        let allow = parse_allowlist("1,2").unwrap();
        assert_eq!(
            classify(
                "No Employee found for the given employee field value. 'attendance_device_id': 77",
                &allow
            ),
            ErrorClass::Allowlisted
        );
        assert_eq!(
            classify(EMPLOYEE_INACTIVE_ERROR_MESSAGE, &allow),
            ErrorClass::Allowlisted
        );
    }

    #[test]
    fn non_selected_known_error_is_unclassified() {
        let allow = parse_allowlist("2").unwrap();
        assert_eq!(
            classify(EMPLOYEE_NOT_FOUND_ERROR_MESSAGE, &allow),
            ErrorClass::Unclassified
        );
    }

    #[test]
    fn unknown_message_is_unclassified() {
        assert_eq!(
            classify("Insufficient Permission for Employee Checkin", &all_known()),
            ErrorClass::Unclassified
        );
    }

    #[test]
    fn parse_allowlist_maps_one_based_indices() {
        assert_eq!(
            parse_allowlist(" 3 , 1").unwrap(),
            vec![
                DUPLICATE_EMPLOYEE_CHECKIN_ERROR_MESSAGE.to_string(),
                EMPLOYEE_NOT_FOUND_ERROR_MESSAGE.to_string(),
            ]
        );
        assert!(parse_allowlist("").unwrap().is_empty());
    }

    #[test]
    fn parse_allowlist_rejects_bad_entries() {
        assert!(parse_allowlist("0").is_err());
        assert!(parse_allowlist("4").is_err());
        assert!(parse_allowlist("two").is_err());
    }

    #[test]
    fn extracts_last_segment_of_exc_traceback() {
        let traceback = "Traceback (most recent call last):\n  File \"apps/frappe/frappe/app.py\", line 95, in application\n    response = frappe.api.handle()\nfrappe.exceptions.ValidationError: No Employee found for the given employee field value\n";
        let body = serde_json::json!({
            "exc_type": "ValidationError",
            "exc": serde_json::to_string(&vec![traceback]).unwrap(),
        })
        .to_string();

        assert_eq!(extract_error_message(&body), EMPLOYEE_NOT_FOUND_ERROR_MESSAGE);
    }

    #[test]
    fn extracts_plain_exc_message() {
        let body = serde_json::json!({
            "exc": serde_json::to_string(&vec![
                "frappe.exceptions.ValidationError: This employee already has a log with the same timestamp"
            ]).unwrap(),
        })
        .to_string();
        assert_eq!(
            extract_error_message(&body),
            DUPLICATE_EMPLOYEE_CHECKIN_ERROR_MESSAGE
        );
    }

    #[test]
    fn extracts_server_messages_as_frappe_encodes_them() {
        let inner = serde_json::json!({ "message": "Transactions cannot be created for an Inactive Employee", "indicator": "red" }).to_string();
        let body = serde_json::json!({
            "_server_messages": serde_json::to_string(&vec![inner]).unwrap(),
        })
        .to_string();
        assert_eq!(extract_error_message(&body), EMPLOYEE_INACTIVE_ERROR_MESSAGE);
    }

    #[test]
    fn extracts_server_messages_as_plain_array() {
        let body = serde_json::json!({
            "_server_messages": [{ "message": "Not permitted" }],
        })
        .to_string();
        assert_eq!(extract_error_message(&body), "Not permitted");
    }

    #[test]
    fn falls_back_to_whole_body() {
        let body = r#"{"message": "something odd"}"#;
        assert_eq!(extract_error_message(body), r#"{"message":"something odd"}"#);
        assert_eq!(extract_error_message("502 Bad Gateway\n"), "502 Bad Gateway");
    }
}
