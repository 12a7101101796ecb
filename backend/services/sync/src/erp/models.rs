use serde::{Deserialize, Serialize};

use super::classify::ErrorClass;

/// Body of `add_log_based_on_employee_field`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinRequest {
    pub employee_field_value: String,
    /// `%Y-%m-%d %H:%M:%S`, device-local.
    pub timestamp: String,
    pub log_type: String,
    pub device_id: String,
}

/// Successful check-in response: `{"message": {"name": "EMP-CKIN-..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckinResponse {
    pub message: CreatedDoc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedDoc {
    pub name: String,
}

/// Body posted to the remote error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorLogRequest {
    pub title: String,
    pub error: String,
}

/// What a single forward produced.
///
/// On success `message` is the created check-in's name, otherwise the
/// extracted rejection text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardResponse {
    pub status: u16,
    pub message: String,
    pub class: Option<ErrorClass>,
}

impl ForwardResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}
