use std::path::Path;

use attendance_common::error::{AttendanceError, AttendanceResult};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Informational log, INFO and above.
pub const INFO_LOG_FILE: &str = "logs.log";
/// Operator-facing error log, ERROR only.
pub const ERROR_LOG_FILE: &str = "error.log";

/// Keeps the non-blocking file writers flushing. Drop on shutdown.
#[must_use = "dropping the guards stops the file writers"]
pub struct TracingGuards {
    _info: WorkerGuard,
    _error: WorkerGuard,
}

/// Initialize the tracing subscriber with env-based filtering on the console
/// and two append-only log files under `logs_dir`.
///
/// Reads `RUST_LOG` (or `LOG_LEVEL`) to set the console filter.
/// Defaults to `default_level` if neither is set.
pub fn init_tracing(default_level: &str, logs_dir: &Path) -> AttendanceResult<TracingGuards> {
    std::fs::create_dir_all(logs_dir)?;

    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (info_writer, info_guard) =
        tracing_appender::non_blocking(rolling::never(logs_dir, INFO_LOG_FILE));
    let (error_writer, error_guard) =
        tracing_appender::non_blocking(rolling::never(logs_dir, ERROR_LOG_FILE));

    let console = fmt::layer().with_target(true).with_filter(filter);

    let info_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(info_writer)
        .with_filter(LevelFilter::INFO);

    let error_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(error_writer)
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(console)
        .with(info_layer)
        .with(error_layer)
        .try_init()
        .map_err(|e| AttendanceError::Internal(format!("failed to set tracing subscriber: {e}")))?;

    tracing::info!(logs_dir = %logs_dir.display(), "logging initialized");

    Ok(TracingGuards {
        _info: info_guard,
        _error: error_guard,
    })
}
