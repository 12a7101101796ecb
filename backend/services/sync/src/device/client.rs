use std::time::Duration;

use attendance_common::error::{AttendanceError, AttendanceResult};
use attendance_common::types::AttendanceRecord;
use attendance_config::{get_var, get_var_or, parse_var_or};
use chrono::{DateTime, FixedOffset};
use reqwest::{Client, StatusCode};

use super::models::{format_device_time, DoorEvent, DoorEventQuery, DoorEventResponse};
use crate::cursor::FetchWindow;

pub const PAGE_SIZE: u32 = 500;

const DEFAULT_API_URL: &str = "https://127.0.0.1:443/artemis/api/acs/v1/door/events";

#[derive(Debug, Clone)]
pub struct DeviceClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub api_signature: String,
    pub event_type: u32,
    pub door_index_codes: Vec<String>,
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl DeviceClientConfig {
    /// Load device API config from environment.
    ///
    /// Key and signature are required; everything else has a default that
    /// matches a stock controller install.
    pub fn from_env() -> AttendanceResult<Self> {
        let door_index_codes = parse_door_codes(&get_var_or("DEVICE_DOOR_INDEX_CODES", "1"))?;

        Ok(Self {
            api_url: get_var_or("DEVICE_API_URL", DEFAULT_API_URL),
            api_key: get_var("DEVICE_API_KEY")?,
            api_signature: get_var("DEVICE_API_SIGNATURE")?,
            event_type: parse_var_or("DEVICE_EVENT_TYPE", 196893)?,
            door_index_codes,
            accept_invalid_certs: parse_var_or("DEVICE_ACCEPT_INVALID_CERTS", true)?,
            timeout_secs: parse_var_or("DEVICE_TIMEOUT_SECS", 30)?,
            connect_timeout_secs: parse_var_or("DEVICE_CONNECT_TIMEOUT_SECS", 10)?,
        })
    }
}

/// Parse a comma-separated list of door index codes.
pub fn parse_door_codes(raw: &str) -> AttendanceResult<Vec<String>> {
    let codes: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if codes.is_empty() {
        return Err(AttendanceError::Config(
            "DEVICE_DOOR_INDEX_CODES contains no door codes".to_string(),
        ));
    }

    Ok(codes)
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

/// Everything one fetch produced.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Parsed records, ascending by timestamp.
    pub records: Vec<AttendanceRecord>,
    /// Latest timestamp among the parsed records.
    pub max_timestamp: Option<DateTime<FixedOffset>>,
    /// Raw events received across all pages, parsed or not.
    pub raw_events: usize,
}

#[derive(Clone)]
pub struct DeviceClient {
    client: Client,
    config: DeviceClientConfig,
}

impl DeviceClient {
    pub fn new(config: DeviceClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch and parse every event in `window`.
    ///
    /// Transport failures abort the fetch: the error is logged and an empty
    /// outcome without a max timestamp is returned, so the cursor stays put.
    pub async fn fetch(&self, window: &FetchWindow) -> FetchOutcome {
        match self.try_fetch(window).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    start = %format_device_time(&window.start),
                    end = %format_device_time(&window.end),
                    "device event fetch failed"
                );
                FetchOutcome::default()
            }
        }
    }

    /// Page through the event API until an empty page comes back.
    pub async fn try_fetch(&self, window: &FetchWindow) -> Result<FetchOutcome, DeviceClientError> {
        let mut page_no: u32 = 1;
        let mut outcome = FetchOutcome::default();

        loop {
            let events = self.fetch_page(window, page_no).await?;
            if events.is_empty() {
                break;
            }
            tracing::debug!(page_no, count = events.len(), "fetched device page");
            outcome.raw_events += events.len();

            for event in &events {
                match event.to_record() {
                    Ok(record) => {
                        if outcome.max_timestamp.map_or(true, |max| record.timestamp > max) {
                            outcome.max_timestamp = Some(record.timestamp);
                        }
                        outcome.records.push(record);
                    }
                    Err(reason) => {
                        tracing::warn!(
                            person_id = ?event.person_id,
                            device_time = ?event.device_time,
                            reason = %reason,
                            "dropping device event"
                        );
                    }
                }
            }

            page_no += 1;
        }

        // Stable: events with equal timestamps keep page order.
        outcome.records.sort_by_key(|r| r.timestamp);

        tracing::info!(
            raw = outcome.raw_events,
            parsed = outcome.records.len(),
            pages = page_no - 1,
            "device fetch complete"
        );
        Ok(outcome)
    }

    async fn fetch_page(
        &self,
        window: &FetchWindow,
        page_no: u32,
    ) -> Result<Vec<DoorEvent>, DeviceClientError> {
        let query = DoorEventQuery {
            start_time: format_device_time(&window.start),
            end_time: format_device_time(&window.end),
            event_type: self.config.event_type,
            door_index_codes: self.config.door_index_codes.clone(),
            page_no,
            page_size: PAGE_SIZE,
            temperature_status: -1,
            mask_status: -1,
            order_type: 1,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json;charset=UTF-8")
            .header("X-Ca-Key", &self.config.api_key)
            .header("X-Ca-Signature", &self.config.api_signature)
            .json(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceClientError::HttpError { status, body });
        }

        let page = response.json::<DoorEventResponse>().await?;
        Ok(page.into_events())
    }
}
