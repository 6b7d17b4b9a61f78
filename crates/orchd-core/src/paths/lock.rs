//! Lock directory and lock triplet path resolution.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::PathError;

/// Environment variable overriding the lock directory.
pub const LOCK_DIR_ENV: &str = "ORCHD_LOCK_DIR";

/// Returns the directory holding lock triplets.
///
/// Resolution order:
/// 1. `ORCHD_LOCK_DIR` environment variable
/// 2. The system temp directory
pub fn default_lock_dir() -> PathBuf {
    env::var_os(LOCK_DIR_ENV)
        .filter(|value| !value.is_empty())
        .map_or_else(env::temp_dir, PathBuf::from)
}

/// Create the lock directory if it does not exist yet.
pub fn ensure_lock_dir(dir: &Path) -> Result<(), PathError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(PathError::NotADirectory(dir.to_path_buf()));
        }
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|e| PathError::CreateFailed {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })
}

/// The three sibling files of one port's lock triplet.
///
/// File naming inside the lock directory, for port `P`:
/// - `orchestrator-P.lock` (authoritative)
/// - `orchestrator-P.pid` (advisory mirror)
/// - `orchestrator-P.state.json` (advisory mirror)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPaths {
    pub lock: PathBuf,
    pub pid: PathBuf,
    pub state: PathBuf,
}

impl LockPaths {
    pub fn for_port(dir: &Path, port: u16) -> Self {
        let stem = format!("orchestrator-{port}");
        Self {
            lock: dir.join(format!("{stem}.lock")),
            pid: dir.join(format!("{stem}.pid")),
            state: dir.join(format!("{stem}.state.json")),
        }
    }

    /// Teardown order: mirrors first, `lock` last.
    pub fn teardown_order(&self) -> [&Path; 3] {
        [&self.state, &self.pid, &self.lock]
    }

    /// Directory containing the triplet.
    pub fn dir(&self) -> Option<&Path> {
        self.lock.parent()
    }
}
