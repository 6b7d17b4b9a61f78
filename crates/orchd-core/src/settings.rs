//! Guard settings, env overrides and validation.
//!
//! This module contains the knobs of the admission controller and the lock
//! manager. These are pure domain types with no infrastructure dependencies;
//! the CLI decides where values come from (`.env`, environment, flags).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paths::{LOCK_DIR_ENV, default_lock_dir};

/// Default well-known orchestrator port.
pub const DEFAULT_PORT: u16 = 9500;

/// Default number of admitted spawns per sliding window.
pub const DEFAULT_SPAWN_THRESHOLD: usize = 30;

/// Default sliding window length in seconds.
pub const DEFAULT_SPAWN_WINDOW_SECS: u64 = 10;

/// Default hard ceiling on host-wide process count.
pub const DEFAULT_SYSTEM_PROCESS_LIMIT: usize = 2000;

/// Default process count above which admissions are logged as warnings.
pub const DEFAULT_SYSTEM_WARNING_LIMIT: usize = 1500;

/// Default cooldown applied when the process table grows quickly.
pub const DEFAULT_GROWTH_COOLDOWN_MS: u64 = 2000;

/// Default grace period between SIGTERM and SIGKILL during force takeover.
pub const DEFAULT_FORCE_GRACE_SECS: u64 = 3;

/// Settings for the lock manager and the fork-bomb detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GuardSettings {
    /// Directory holding lock triplets.
    pub lock_dir: PathBuf,

    /// Well-known orchestrator port guarded by the lock.
    pub port: u16,

    /// Maximum admitted spawns inside one window.
    pub spawn_threshold: usize,

    /// Sliding window length in seconds.
    pub spawn_window_secs: u64,

    /// Hard ceiling on host-wide process count; above it every spawn is denied.
    pub system_process_limit: usize,

    /// Soft limit; above it admissions still succeed but are logged.
    pub system_warning_limit: usize,

    /// Cooldown in milliseconds when more than 10 processes appeared since
    /// the previous admission check.
    pub growth_cooldown_ms: u64,

    /// Seconds to wait after SIGTERM before escalating to SIGKILL (1-5).
    pub force_grace_secs: u64,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl GuardSettings {
    /// Create settings with sensible defaults.
    pub fn with_defaults() -> Self {
        Self {
            lock_dir: default_lock_dir(),
            port: DEFAULT_PORT,
            spawn_threshold: DEFAULT_SPAWN_THRESHOLD,
            spawn_window_secs: DEFAULT_SPAWN_WINDOW_SECS,
            system_process_limit: DEFAULT_SYSTEM_PROCESS_LIMIT,
            system_warning_limit: DEFAULT_SYSTEM_WARNING_LIMIT,
            growth_cooldown_ms: DEFAULT_GROWTH_COOLDOWN_MS,
            force_grace_secs: DEFAULT_FORCE_GRACE_SECS,
        }
    }

    /// Defaults overlaid with `ORCHD_*` environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, but unparseable variables keep their default and
    /// are returned alongside instead of failing.
    pub fn from_env_lossy() -> (Self, Vec<SettingsError>) {
        Self::from_lookup_lossy(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup.
    ///
    /// Keys are the `ORCHD_*` names; unset or empty keys keep the default.
    /// The first unparseable key is the error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (settings, errors) = Self::from_lookup_lossy(lookup);
        errors.into_iter().next().map_or(Ok(settings), Err)
    }

    /// Defaults overlaid with every parseable key; the rest are reported.
    pub fn from_lookup_lossy<F>(lookup: F) -> (Self, Vec<SettingsError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut errors = Vec::new();

        let overrides = SettingsOverrides {
            lock_dir: get(LOCK_DIR_ENV).map(PathBuf::from),
            port: parse_var(&get, "ORCHD_PORT", &mut errors),
            spawn_threshold: parse_var(&get, "ORCHD_SPAWN_THRESHOLD", &mut errors),
            spawn_window_secs: parse_var(&get, "ORCHD_SPAWN_WINDOW_SECS", &mut errors),
            system_process_limit: parse_var(&get, "ORCHD_SYSTEM_PROCESS_LIMIT", &mut errors),
            system_warning_limit: parse_var(&get, "ORCHD_SYSTEM_WARNING_LIMIT", &mut errors),
            growth_cooldown_ms: parse_var(&get, "ORCHD_GROWTH_COOLDOWN_MS", &mut errors),
            force_grace_secs: parse_var(&get, "ORCHD_FORCE_GRACE_SECS", &mut errors),
        };

        let mut settings = Self::with_defaults();
        settings.merge(&overrides);
        (settings, errors)
    }

    /// Overlay every field that is `Some` in `overrides`.
    pub fn merge(&mut self, overrides: &SettingsOverrides) {
        if let Some(ref dir) = overrides.lock_dir {
            self.lock_dir.clone_from(dir);
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(threshold) = overrides.spawn_threshold {
            self.spawn_threshold = threshold;
        }
        if let Some(window) = overrides.spawn_window_secs {
            self.spawn_window_secs = window;
        }
        if let Some(limit) = overrides.system_process_limit {
            self.system_process_limit = limit;
        }
        if let Some(limit) = overrides.system_warning_limit {
            self.system_warning_limit = limit;
        }
        if let Some(cooldown) = overrides.growth_cooldown_ms {
            self.growth_cooldown_ms = cooldown;
        }
        if let Some(grace) = overrides.force_grace_secs {
            self.force_grace_secs = grace;
        }
    }

    pub const fn spawn_window(&self) -> Duration {
        Duration::from_secs(self.spawn_window_secs)
    }

    pub const fn growth_cooldown(&self) -> Duration {
        Duration::from_millis(self.growth_cooldown_ms)
    }

    pub const fn force_grace(&self) -> Duration {
        Duration::from_secs(self.force_grace_secs)
    }
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsOverrides {
    pub lock_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub spawn_threshold: Option<usize>,
    pub spawn_window_secs: Option<u64>,
    pub system_process_limit: Option<usize>,
    pub system_warning_limit: Option<usize>,
    pub growth_cooldown_ms: Option<u64>,
    pub force_grace_secs: Option<u64>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Port must be non-zero")]
    InvalidPort,

    #[error("Spawn threshold must be at least 1")]
    ZeroThreshold,

    #[error("Spawn window must be at least 1 second")]
    ZeroWindow,

    #[error("System warning limit ({warning}) must not exceed the process limit ({limit})")]
    WarningAboveLimit { warning: usize, limit: usize },

    #[error("Force grace period must be between 1 and 5 seconds, got {0}")]
    InvalidGrace(u64),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &GuardSettings) -> Result<(), SettingsError> {
    if settings.port == 0 {
        return Err(SettingsError::InvalidPort);
    }

    validate_admission_settings(settings)?;

    if !(1..=5).contains(&settings.force_grace_secs) {
        return Err(SettingsError::InvalidGrace(settings.force_grace_secs));
    }

    Ok(())
}

/// Validate only the knobs the fork-bomb detector reads.
pub fn validate_admission_settings(settings: &GuardSettings) -> Result<(), SettingsError> {
    if settings.spawn_threshold == 0 {
        return Err(SettingsError::ZeroThreshold);
    }

    if settings.spawn_window_secs == 0 {
        return Err(SettingsError::ZeroWindow);
    }

    if settings.system_warning_limit > settings.system_process_limit {
        return Err(SettingsError::WarningAboveLimit {
            warning: settings.system_warning_limit,
            limit: settings.system_process_limit,
        });
    }

    Ok(())
}

fn parse_var<T, G>(get: &G, key: &str, errors: &mut Vec<SettingsError>) -> Option<T>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    let value = get(key)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(SettingsError::InvalidEnv {
                key: key.to_string(),
                value,
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = GuardSettings::with_defaults();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.spawn_threshold, 30);
        assert_eq!(settings.spawn_window(), Duration::from_secs(10));
        assert_eq!(settings.system_process_limit, 2000);
        assert_eq!(settings.growth_cooldown(), Duration::from_secs(2));
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let settings = GuardSettings::from_lookup(lookup(&[
            ("ORCHD_PORT", "9600"),
            ("ORCHD_SPAWN_THRESHOLD", " 5 "),
            ("ORCHD_LOCK_DIR", "/run/orchd"),
            ("ORCHD_GROWTH_COOLDOWN_MS", ""),
        ]))
        .unwrap();

        assert_eq!(settings.port, 9600);
        assert_eq!(settings.spawn_threshold, 5);
        assert_eq!(settings.lock_dir, PathBuf::from("/run/orchd"));
        // Empty value keeps the default
        assert_eq!(settings.growth_cooldown_ms, DEFAULT_GROWTH_COOLDOWN_MS);
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let err = GuardSettings::from_lookup(lookup(&[("ORCHD_PORT", "ninety")])).unwrap_err();
        assert_eq!(
            err,
            SettingsError::InvalidEnv {
                key: "ORCHD_PORT".to_string(),
                value: "ninety".to_string(),
            }
        );
    }

    #[test]
    fn test_lossy_lookup_keeps_defaults_for_garbage() {
        let (settings, errors) = GuardSettings::from_lookup_lossy(lookup(&[
            ("ORCHD_SPAWN_THRESHOLD", "abc"),
            ("ORCHD_FORCE_GRACE_SECS", "-1"),
            ("ORCHD_PORT", "9700"),
        ]));

        assert_eq!(settings.port, 9700);
        assert_eq!(settings.spawn_threshold, DEFAULT_SPAWN_THRESHOLD);
        assert_eq!(settings.force_grace_secs, DEFAULT_FORCE_GRACE_SECS);
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&SettingsError::InvalidEnv {
            key: "ORCHD_SPAWN_THRESHOLD".to_string(),
            value: "abc".to_string(),
        }));
    }

    #[test]
    fn test_admission_validation_ignores_port_and_grace() {
        let settings = GuardSettings {
            port: 0,
            force_grace_secs: 9,
            ..GuardSettings::with_defaults()
        };
        assert!(validate_admission_settings(&settings).is_ok());
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_merge_only_touches_some_fields() {
        let mut settings = GuardSettings::with_defaults();
        settings.merge(&SettingsOverrides {
            system_process_limit: Some(4000),
            ..Default::default()
        });
        assert_eq!(settings.system_process_limit, 4000);
        assert_eq!(settings.system_warning_limit, DEFAULT_SYSTEM_WARNING_LIMIT);
    }

    #[test]
    fn test_validate_zero_threshold() {
        let settings = GuardSettings {
            spawn_threshold: 0,
            ..GuardSettings::with_defaults()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::ZeroThreshold)
        );
    }

    #[test]
    fn test_validate_zero_window() {
        let settings = GuardSettings {
            spawn_window_secs: 0,
            ..GuardSettings::with_defaults()
        };
        assert_eq!(validate_settings(&settings), Err(SettingsError::ZeroWindow));
    }

    #[test]
    fn test_validate_warning_above_limit() {
        let settings = GuardSettings {
            system_warning_limit: 3000,
            ..GuardSettings::with_defaults()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::WarningAboveLimit { warning: 3000, .. })
        ));
    }

    #[test]
    fn test_validate_grace_range() {
        for grace in [0, 6] {
            let settings = GuardSettings {
                force_grace_secs: grace,
                ..GuardSettings::with_defaults()
            };
            assert_eq!(
                validate_settings(&settings),
                Err(SettingsError::InvalidGrace(grace))
            );
        }
    }

    #[test]
    fn test_validate_port_zero() {
        let settings = GuardSettings {
            port: 0,
            ..GuardSettings::with_defaults()
        };
        assert_eq!(validate_settings(&settings), Err(SettingsError::InvalidPort));
    }
}
