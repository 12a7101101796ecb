mod connector;
mod cursor;
mod device;
mod erp;
mod maintenance;
mod scheduler;
mod syncer;

use attendance_common::types::ServiceInfo;
use attendance_config::{init_tracing, AppConfig};
use attendance_store::{JsonCheckpointRepository, JsonLedgerRepository};
use chrono::Utc;

use crate::cursor::TimeWindowCursor;
use crate::device::client::{DeviceClient, DeviceClientConfig};
use crate::erp::client::{ErpClient, ErpClientConfig};
use crate::maintenance::LogMaintenance;
use crate::syncer::AttendanceSyncer;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = AppConfig::from_env().expect("invalid service configuration");
    let _guards = init_tracing(&config.log_level, &config.logs_directory)
        .expect("failed to initialise logging");

    let info = ServiceInfo::new("attendance-sync");
    tracing::info!(
        service = %info.name,
        version = %info.version,
        instance_id = %info.instance_id,
        logs_directory = %config.logs_directory.display(),
        interval_secs = config.sync_interval_secs,
        "starting"
    );

    let device_config = DeviceClientConfig::from_env().expect("invalid device configuration");
    tracing::info!(
        url = %device_config.api_url,
        doors = ?device_config.door_index_codes,
        "device client configured"
    );
    let device = DeviceClient::new(device_config).expect("failed to create device client");

    let erp_config = ErpClientConfig::from_env().expect("invalid ERPNext configuration");
    let erp = ErpClient::new(erp_config).expect("failed to create ERPNext client");
    tracing::info!(
        checkin_url = %erp.checkin_url(),
        allowed_exceptions = erp.config().allowed_exceptions.len(),
        "ERPNext client configured"
    );

    let checkpoint_repo = JsonCheckpointRepository::new(config.checkpoint_path());
    let cursor = TimeWindowCursor::load(checkpoint_repo, config.import_start_date, Utc::now())
        .expect("failed to load sync checkpoint");
    let ledger =
        JsonLedgerRepository::open(config.ledger_path()).expect("failed to open processed-entry ledger");
    let maintenance = LogMaintenance::new(config.log_files(), config.log_clear_interval_days);

    let mut syncer = AttendanceSyncer::new(device, erp, cursor, ledger, maintenance);

    let cycles = scheduler::run_forever(&mut syncer, config.sync_interval()).await;
    tracing::info!(cycles, "stopped");
}
