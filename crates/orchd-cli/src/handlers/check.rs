//! Check command handler.

use anyhow::Result;
use orchd_core::domain::OrchestratorDescriptor;
use orchd_core::settings::GuardSettings;
use orchd_runtime::{HostProcessProbe, LockManager};

/// Execute the check command.
///
/// Prints the running peer or states that none is running. Exits 0 either way.
pub fn execute(settings: &GuardSettings, json: bool) -> Result<()> {
    let lock = LockManager::from_settings(HostProcessProbe::new(), settings);
    let peer = lock.detect_peer(settings.port);

    if json {
        println!("{}", serde_json::to_string(&peer)?);
    } else {
        println!("{}", render(settings.port, peer.as_ref()));
    }
    Ok(())
}

fn render(port: u16, peer: Option<&OrchestratorDescriptor>) -> String {
    peer.map_or_else(
        || format!("No orchestrator running on port {port}"),
        |peer| format!("Orchestrator running: {peer}\nStop it with: {}", peer.kill_hint()),
    )
}
