//! On-disk and CLI-facing formats that other orchestrators rely on.

use std::path::Path;

use orchd_core::{
    GuardSettings, LockPaths, OrchestratorDescriptor, PeerPid, StateRecord, validate_settings,
};

#[test]
fn state_written_by_other_implementations_is_readable() {
    let json = r#"{
        "pid": 31337,
        "port": 9500,
        "start_time": 1718000000.25,
        "cmdline": "python -m orchestrator --port 9500",
        "version": "2.1"
    }"#;

    let record: StateRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.pid, 31337);
    assert_eq!(record.port, 9500);
    let started = record.started_at().unwrap();
    assert_eq!(started.timestamp(), 1_718_000_000);
    assert_eq!(started.timestamp_subsec_millis(), 250);
}

#[test]
fn descriptor_json_uses_unknown_marker() {
    let known = OrchestratorDescriptor::new(12, 9500, Some("orchestrator".into()));
    let unknown = OrchestratorDescriptor::unknown(9500);

    let known_json = serde_json::to_value(&known).unwrap();
    let unknown_json = serde_json::to_value(&unknown).unwrap();

    assert_eq!(known_json["pid"], 12);
    assert_eq!(unknown_json["pid"], "unknown");
    assert_eq!(unknown.pid.known(), None);
    assert_eq!(known.pid, PeerPid::Known(12));
}

#[test]
fn triplet_names_are_shared_across_processes() {
    let paths = LockPaths::for_port(Path::new("/tmp"), 9500);
    assert_eq!(paths.lock, Path::new("/tmp/orchestrator-9500.lock"));
    assert_eq!(paths.pid, Path::new("/tmp/orchestrator-9500.pid"));
    assert_eq!(paths.state, Path::new("/tmp/orchestrator-9500.state.json"));
}

#[test]
fn env_layer_feeds_validation() {
    let settings = GuardSettings::from_lookup(|key| match key {
        "ORCHD_SYSTEM_PROCESS_LIMIT" => Some("1000".to_string()),
        _ => None,
    })
    .unwrap();

    // Default warning limit (1500) is now above the ceiling
    assert!(validate_settings(&settings).is_err());
}
