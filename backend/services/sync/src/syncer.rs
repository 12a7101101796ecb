use async_trait::async_trait;
use chrono::Utc;

use attendance_store::checkpoint::repositories::CheckpointRepository;
use attendance_store::ledger::repositories::LedgerRepository;

use crate::connector::{Connector, SyncReport};
use crate::cursor::TimeWindowCursor;
use crate::device::client::DeviceClient;
use crate::device::models::format_device_time;
use crate::erp::classify::ErrorClass;
use crate::erp::client::ErpClient;
use crate::maintenance::LogMaintenance;

const SOURCE: &str = "biometric";

/// One fetch-then-forward pass per `sync` call.
pub struct AttendanceSyncer<C, L> {
    device: DeviceClient,
    erp: ErpClient,
    cursor: TimeWindowCursor<C>,
    ledger: L,
    maintenance: LogMaintenance,
}

impl<C, L> AttendanceSyncer<C, L>
where
    C: CheckpointRepository,
    L: LedgerRepository,
{
    pub fn new(
        device: DeviceClient,
        erp: ErpClient,
        cursor: TimeWindowCursor<C>,
        ledger: L,
        maintenance: LogMaintenance,
    ) -> Self {
        Self {
            device,
            erp,
            cursor,
            ledger,
            maintenance,
        }
    }

    #[cfg(test)]
    pub fn cursor(&self) -> &TimeWindowCursor<C> {
        &self.cursor
    }
}

#[async_trait]
impl<C, L> Connector for AttendanceSyncer<C, L>
where
    C: CheckpointRepository,
    L: LedgerRepository,
{
    fn source_name(&self) -> &str {
        SOURCE
    }

    async fn sync(&mut self) -> Result<SyncReport, Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();

        if let Err(e) = self.maintenance.run_if_due(&mut self.cursor, now) {
            tracing::warn!(error = %e, "log maintenance failed");
        }

        let window = self.cursor.window(now);
        tracing::info!(
            start = %format_device_time(&window.start),
            end = %format_device_time(&window.end),
            "fetching device events"
        );

        let outcome = self.device.fetch(&window).await;
        let mut report = SyncReport {
            source: SOURCE.to_string(),
            fetched: outcome.records.len(),
            ..SyncReport::default()
        };

        // Failures never stop the pass; the next window covers them again.
        for record in &outcome.records {
            let result = self
                .erp
                .forward(&record.employee_field_value, &record.timestamp, record.log_type)
                .await;

            match result {
                Ok(resp) if resp.is_success() => {
                    report.forwarded += 1;
                    if let Err(e) = self.ledger.record_success(&record.ledger_key()) {
                        tracing::warn!(
                            key = %record.ledger_key(),
                            error = %e,
                            "failed to record processed entry"
                        );
                    }
                }
                Ok(resp) => match resp.class {
                    Some(ErrorClass::Duplicate) => report.duplicates += 1,
                    Some(ErrorClass::Allowlisted) => report.ignored += 1,
                    Some(ErrorClass::Unclassified) | None => {
                        report.failed += 1;
                        tracing::warn!(
                            employee = %record.employee_field_value,
                            timestamp = %record.timestamp,
                            status = resp.status,
                            "skipping record"
                        );
                    }
                },
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        employee = %record.employee_field_value,
                        timestamp = %record.timestamp,
                        error = %e,
                        "check-in request failed"
                    );
                }
            }
        }

        self.cursor
            .advance(outcome.max_timestamp)
            .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })?;

        tracing::debug!(
            latest_fetched_time = ?self.cursor.latest_fetched_time(),
            ledger_entries = self.ledger.len(),
            "sync cycle completed"
        );
        Ok(report)
    }
}
