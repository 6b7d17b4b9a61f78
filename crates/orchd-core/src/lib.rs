#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{LoadSnapshot, LockState, OrchestratorDescriptor, PeerPid, StateRecord};
pub use paths::{LOCK_DIR_ENV, LockPaths, PathError, default_lock_dir, ensure_lock_dir};
pub use ports::{LoadSampler, ORCHESTRATOR_MARKER, ProcessProbe, cmdline_marks_orchestrator};
pub use settings::{
    DEFAULT_FORCE_GRACE_SECS, DEFAULT_GROWTH_COOLDOWN_MS, DEFAULT_PORT, DEFAULT_SPAWN_THRESHOLD,
    DEFAULT_SPAWN_WINDOW_SECS, DEFAULT_SYSTEM_PROCESS_LIMIT, DEFAULT_SYSTEM_WARNING_LIMIT,
    GuardSettings, SettingsError, SettingsOverrides, validate_admission_settings, validate_settings,
};
