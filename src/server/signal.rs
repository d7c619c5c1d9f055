// Signal handling module
//
// SIGTERM and SIGINT (Ctrl+C) request a shutdown: the accept loop stops and
// in-flight connections are left to finish.

use crate::logger;
use std::sync::Arc;
use tokio::sync::Notify;

/// Spawn a task that fires `shutdown` on the first SIGTERM or SIGINT.
///
/// Must be called from within a Tokio runtime.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => logger::log_info("SIGTERM received, shutting down"),
            _ = sigint.recv() => logger::log_info("SIGINT received, shutting down"),
        }
        // notify_one stores a permit if the loop is not waiting right now
        shutdown.notify_one();
    });
    Ok(())
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("Ctrl+C received, shutting down");
            shutdown.notify_one();
        }
    });
    Ok(())
}
