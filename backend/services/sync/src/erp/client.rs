use std::time::Duration;

use attendance_common::error::AttendanceResult;
use attendance_common::types::LogType;
use attendance_config::{get_var, get_var_or, parse_var_or};
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, StatusCode};

use super::classify::{classify, extract_error_message, parse_allowlist, ErrorClass};
use super::models::{CheckinRequest, CheckinResponse, ForwardResponse};
use super::relay::ErrorLogRelay;
use crate::device::models::device_offset;

const CHECKIN_METHOD: &str =
    "hr.doctype.employee_checkin.employee_checkin.add_log_based_on_employee_field";

pub const INVALID_EMPLOYEE_MESSAGE: &str = "Invalid employee field value";

#[derive(Debug, Clone)]
pub struct ErpClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Major version. Above 13 the check-in method lives in `hrms`.
    pub version: u32,
    pub device_id: String,
    /// Messages whose rejections go to the remote error log instead of ours.
    pub allowed_exceptions: Vec<String>,
    pub error_log_path: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl ErpClientConfig {
    /// Load ERPNext config from environment. URL and credentials are required.
    pub fn from_env() -> AttendanceResult<Self> {
        let base_url = get_var("ERPNEXT_URL")?.trim_end_matches('/').to_string();
        let allowed_exceptions = parse_allowlist(&get_var_or("ALLOWED_EXCEPTIONS", "1,2,3"))?;

        Ok(Self {
            base_url,
            api_key: get_var("ERPNEXT_API_KEY")?,
            api_secret: get_var("ERPNEXT_API_SECRET")?,
            version: parse_var_or("ERPNEXT_VERSION", 14)?,
            device_id: get_var_or("ERPNEXT_DEVICE_ID", "hikvision"),
            allowed_exceptions,
            error_log_path: get_var_or("ERPNEXT_ERROR_LOG_PATH", "/api/resource/Error Log"),
            timeout_secs: parse_var_or("ERPNEXT_TIMEOUT_SECS", 30)?,
            connect_timeout_secs: parse_var_or("ERPNEXT_CONNECT_TIMEOUT_SECS", 10)?,
        })
    }

    fn app_namespace(&self) -> &'static str {
        if self.version > 13 {
            "hrms"
        } else {
            "erpnext"
        }
    }

    fn authorization(&self) -> String {
        format!("token {}:{}", self.api_key, self.api_secret)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErpClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct ErpClient {
    client: Client,
    config: ErpClientConfig,
    relay: ErrorLogRelay,
}

impl ErpClient {
    pub fn new(config: ErpClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        let relay = ErrorLogRelay::new(
            client.clone(),
            format!("{}{}", config.base_url, config.error_log_path),
            config.authorization(),
        );
        Ok(Self {
            client,
            config,
            relay,
        })
    }

    pub fn config(&self) -> &ErpClientConfig {
        &self.config
    }

    pub fn checkin_url(&self) -> String {
        format!(
            "{}/api/method/{}.{}",
            self.config.base_url,
            self.config.app_namespace(),
            CHECKIN_METHOD
        )
    }

    /// Submit one check-in.
    ///
    /// Rejections come back as `Ok` with the extracted message and its class;
    /// only transport failures or an unreadable success body are `Err`.
    /// Duplicates log at INFO, allowlisted rejections are relayed and log at
    /// WARN, everything else logs at ERROR with the request payload.
    pub async fn forward(
        &self,
        employee_field_value: &str,
        timestamp: &DateTime<FixedOffset>,
        log_type: LogType,
    ) -> Result<ForwardResponse, ErpClientError> {
        let employee_field_value = employee_field_value.trim();
        if employee_field_value.is_empty() {
            tracing::error!(timestamp = %timestamp, %log_type, "refusing check-in without employee field value");
            return Ok(ForwardResponse {
                status: 400,
                message: INVALID_EMPLOYEE_MESSAGE.to_string(),
                class: Some(ErrorClass::Unclassified),
            });
        }

        let payload = CheckinRequest {
            employee_field_value: employee_field_value.to_string(),
            timestamp: timestamp
                .with_timezone(&device_offset())
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            log_type: log_type.as_str().to_string(),
            device_id: self.config.device_id.clone(),
        };
        let payload_json = serde_json::to_string(&payload).unwrap_or_default();

        tracing::info!(request = %payload_json, "sending check-in");

        let response = self
            .client
            .post(self.checkin_url())
            .header("Authorization", self.config.authorization())
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), response = %body, "check-in response");

        if status == StatusCode::OK {
            let created: CheckinResponse = serde_json::from_str(&body)
                .map_err(|_| ErpClientError::HttpError { status, body })?;
            tracing::info!(
                employee = employee_field_value,
                name = %created.message.name,
                "check-in created"
            );
            return Ok(ForwardResponse {
                status: status.as_u16(),
                message: created.message.name,
                class: None,
            });
        }

        let message = extract_error_message(&body);
        let class = classify(&message, &self.config.allowed_exceptions);

        match class {
            ErrorClass::Duplicate => {
                tracing::info!(
                    employee = employee_field_value,
                    timestamp = %payload.timestamp,
                    "check-in already exists"
                );
            }
            ErrorClass::Allowlisted => {
                tracing::warn!(
                    status = status.as_u16(),
                    message = %message,
                    request = %payload_json,
                    "check-in rejected, relaying to remote error log"
                );
                let title = format!("Attendance sync: check-in rejected for {employee_field_value}");
                self.relay.relay(&title, &message).await;
            }
            ErrorClass::Unclassified => {
                tracing::error!(
                    status = status.as_u16(),
                    response = %body,
                    request = %payload_json,
                    "check-in failed"
                );
            }
        }

        Ok(ForwardResponse {
            status: status.as_u16(),
            message,
            class: Some(class),
        })
    }
}
