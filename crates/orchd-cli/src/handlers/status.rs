//! Status command handler.

use anyhow::Result;
use orchd_core::domain::{LoadSnapshot, OrchestratorDescriptor};
use orchd_core::ports::LoadSampler;
use orchd_core::settings::GuardSettings;
use orchd_runtime::{HostProcessProbe, LockManager, SysinfoLoadSampler};
use serde_json::{Value, json};

/// Execute the status command.
///
/// Prints host load, the admission limits in force and the current peer.
pub fn execute(settings: &GuardSettings, json: bool) -> Result<()> {
    let snapshot = SysinfoLoadSampler::new().snapshot();
    let peer = LockManager::from_settings(HostProcessProbe::new(), settings).detect_peer(settings.port);

    if json {
        println!("{}", serde_json::to_string_pretty(&report(settings, &snapshot, peer.as_ref()))?);
    } else {
        println!("{}", render(settings, &snapshot, peer.as_ref()));
    }
    Ok(())
}

fn report(
    settings: &GuardSettings,
    snapshot: &LoadSnapshot,
    peer: Option<&OrchestratorDescriptor>,
) -> Value {
    json!({
        "load": snapshot,
        "limits": {
            "spawn_threshold": settings.spawn_threshold,
            "spawn_window_secs": settings.spawn_window_secs,
            "system_process_limit": settings.system_process_limit,
            "system_warning_limit": settings.system_warning_limit,
            "growth_cooldown_ms": settings.growth_cooldown_ms,
        },
        "lock_dir": settings.lock_dir,
        "port": settings.port,
        "peer": peer,
    })
}

fn render(
    settings: &GuardSettings,
    snapshot: &LoadSnapshot,
    peer: Option<&OrchestratorDescriptor>,
) -> String {
    let headroom = settings
        .system_process_limit
        .saturating_sub(snapshot.process_count);
    let peer = peer.map_or_else(|| "none".to_string(), ToString::to_string);

    format!(
        "load      = {snapshot}\n\
         limits    = {} spawns / {}s, warn above {} processes, deny above {} ({headroom} headroom)\n\
         lock_dir  = {}\n\
         port      = {}\n\
         peer      = {peer}",
        settings.spawn_threshold,
        settings.spawn_window_secs,
        settings.system_warning_limit,
        settings.system_process_limit,
        settings.lock_dir.display(),
        settings.port,
    )
}
