//! OS signal handling for shutdown.

use std::io;

use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

/// Completes when SIGINT or SIGTERM arrives.
pub async fn shutdown() -> io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => info!(message = "Caught signal, exiting.", signal = "SIGINT"),
        _ = terminate.recv() => info!(message = "Caught signal, exiting.", signal = "SIGTERM"),
    }
    Ok(())
}
