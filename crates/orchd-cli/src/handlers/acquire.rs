//! Acquire command handler.
//!
//! A lock held by an exited process is stale immediately, so the command
//! keeps the lock until it is asked to stop.

use std::future::Future;
use std::io;

use anyhow::Result;
use orchd_core::ports::ProcessProbe;
use orchd_core::settings::GuardSettings;
use orchd_runtime::{HostProcessProbe, LockManager};
use tracing::info;

use crate::error::CliError;

/// Execute the acquire command.
///
/// Exits non-zero if the lock cannot be taken. Otherwise holds it until
/// SIGINT or SIGTERM, releases it and exits 0.
pub async fn execute(settings: &GuardSettings, force: bool) -> Result<()> {
    // Register before the lock exists so an early SIGTERM still releases it
    let stop = shutdown_signal().map_err(CliError::from)?;
    let lock = LockManager::from_settings(HostProcessProbe::new(), settings);
    hold(lock, settings.port, force, stop).await
}

/// Acquire `port`, wait for `stop`, then release.
pub async fn hold<P, F>(mut lock: LockManager<P>, port: u16, force: bool, stop: F) -> Result<()>
where
    P: ProcessProbe,
    F: Future<Output = io::Result<()>>,
{
    lock.try_acquire(port, force).await.map_err(CliError::from)?;
    println!("Acquired lock for port {port} (PID {})", lock.pid());

    let waited = stop.await;
    info!(port = %port, "Shutdown requested, releasing lock");
    lock.release();
    println!("Released lock for port {port}");

    waited.map_err(|e| CliError::from(e).into())
}

/// Resolve on SIGINT, or on SIGTERM where available.
fn shutdown_signal() -> io::Result<impl Future<Output = io::Result<()>>> {
    #[cfg(unix)]
    let mut terminate =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    Ok(async move {
        #[cfg(unix)]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => result,
                _ = terminate.recv() => Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await
        }
    })
}
