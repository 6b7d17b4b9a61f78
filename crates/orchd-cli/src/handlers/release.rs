//! Release command handler.

use anyhow::Result;
use orchd_core::settings::GuardSettings;
use orchd_runtime::StateFiles;
use tracing::warn;

/// Execute the release command.
///
/// Deletes the triplet only if `lock` names `owner` (this process by
/// default). Failures are reported but the command always exits 0.
pub fn execute(settings: &GuardSettings, owner: Option<u32>) -> Result<()> {
    let owner = owner.unwrap_or_else(std::process::id);
    let files = StateFiles::for_port(&settings.lock_dir, settings.port);

    match files.read_owner() {
        Some(pid) if pid == owner => match files.delete_if_owned_by(owner) {
            Ok(()) => println!("Released lock for port {} (PID {owner})", settings.port),
            Err(e) => warn!(error = %e, "Failed to remove lock files"),
        },
        Some(pid) => println!(
            "Lock for port {} is owned by PID {pid}, not {owner}; nothing released",
            settings.port
        ),
        None => println!("No lock held for port {}", settings.port),
    }
    Ok(())
}
