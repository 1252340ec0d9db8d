use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const REQUEST_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Resolves once SIGINT or SIGTERM arrives, after signalling the receiver and
/// cancelling `cancel` so in-flight deal exchanges unwind.
pub fn graceful_shutdown_blocker(
    cancel: CancellationToken,
) -> std::io::Result<(JoinHandle<()>, watch::Receiver<()>)> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let (tx, rx) = watch::channel(());

    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {
                tracing::debug!("gracefully exiting immediately on SIGINT");
            }
            _ = sigterm.recv() => {
                tokio::time::sleep(REQUEST_GRACE_PERIOD).await;
                tracing::debug!("initiating graceful shutdown with delay on SIGTERM");
            }
        }

        cancel.cancel();
        let _ = tx.send(());
    });

    Ok((handle, rx))
}

pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
                panic.column = loc.column(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}

pub fn report_version() {
    let version = crate::Version::new();

    tracing::info!(
        build_profile = ?version.build_profile(),
        features = ?version.build_features(),
        repo_version = ?version.repo_version(),
        version = ?version.version(),
        "service starting up"
    );
}
