use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::connector::Connector;

/// Run `connector.sync()` every `interval` until `shutdown` resolves.
///
/// Errors and panics inside a cycle are logged and the loop carries on. The
/// shutdown future is only polled while sleeping, so a cycle in flight is
/// always allowed to finish. Returns the number of cycles run.
pub async fn run_until<C, F>(connector: &mut C, interval: Duration, shutdown: F) -> u64
where
    C: Connector + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut cycles: u64 = 0;

    loop {
        cycles += 1;
        match AssertUnwindSafe(connector.sync()).catch_unwind().await {
            Ok(Ok(report)) => {
                tracing::info!(
                    source = %report.source,
                    fetched = report.fetched,
                    forwarded = report.forwarded,
                    duplicates = report.duplicates,
                    ignored = report.ignored,
                    failed = report.failed,
                    "cycle finished"
                );
            }
            Ok(Err(e)) => {
                tracing::error!(source = connector.source_name(), error = %e, "cycle failed");
            }
            Err(panic) => {
                tracing::error!(
                    source = connector.source_name(),
                    panic = panic_message(panic.as_ref()),
                    "cycle panicked"
                );
            }
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(cycles, "shutdown requested, stopping");
                return cycles;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Run until Ctrl-C.
pub async fn run_forever<C>(connector: &mut C, interval: Duration) -> u64
where
    C: Connector + ?Sized,
{
    run_until(connector, interval, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
