//! Clean command handler.

use anyhow::Result;
use orchd_core::settings::GuardSettings;
use orchd_runtime::{HostProcessProbe, LockManager, SweepReport};

/// Execute the clean command.
///
/// Removes stale lock files for the configured port. Files of a live owner
/// are left untouched. Always exits 0.
pub fn execute(settings: &GuardSettings) -> Result<()> {
    let lock = LockManager::from_settings(HostProcessProbe::new(), settings);
    let report = lock.clean_stale(settings.port);
    println!("{}", render(&report));
    Ok(())
}

fn render(report: &SweepReport) -> String {
    let mut lines: Vec<String> = report
        .removed
        .iter()
        .map(|path| format!("Removed {}", path.display()))
        .collect();

    if let Some(pid) = report.live_owner {
        lines.push(format!("Lock held by running orchestrator PID {pid}; left untouched"));
    } else if report.lock_pending {
        lines.push("Lock is being created by another process; left untouched".to_string());
    }
    if lines.is_empty() {
        lines.push("No stale lock files".to_string());
    }
    lines.join("\n")
}
