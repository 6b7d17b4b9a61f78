//! Stale triplet cleanup left behind by crashed orchestrators.

use std::path::{Path, PathBuf};
use std::time::Duration;

use orchd_core::ports::ProcessProbe;
use tracing::{debug, info, warn};

use super::io::{StateFiles, read_pid_file, remove_if_exists};

/// A malformed `lock` younger than this may belong to a racer that has
/// created the file but not yet written its PID.
pub const MALFORMED_GRACE: Duration = Duration::from_secs(2);

/// Outcome of one sweep over a port's triplet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files deleted by this pass, in deletion order.
    pub removed: Vec<PathBuf>,
    /// Owner recorded in `lock` that is still a live orchestrator.
    pub live_owner: Option<u32>,
    /// `lock` is unparseable but too fresh to judge.
    pub lock_pending: bool,
}

impl SweepReport {
    /// Nothing left in the way of a claim.
    pub const fn is_clear(&self) -> bool {
        self.live_owner.is_none() && !self.lock_pending
    }
}

/// Whether `pid` may keep a lock: ourselves, or a live orchestrator.
pub fn is_live_owner<P: ProcessProbe + ?Sized>(probe: &P, pid: u32, self_pid: u32) -> bool {
    pid == self_pid || (probe.is_alive(pid) && probe.is_orchestrator(pid))
}

/// Remove stale files of one triplet.
///
/// # Strategy
/// 1. Judge `lock`: live owner (keep), fresh but malformed (keep), or stale
/// 2. Remove mirrors whose PID is malformed, not a live orchestrator, or
///    contradicts a live `lock`
/// 3. Remove a stale `lock` last, re-checking that it is the same file
///    with the same owner so a lock a racer created in the meantime survives
///
/// Failures are logged and skipped; a file that could not be removed only
/// turns a later claim into a lost race.
pub fn sweep_stale<P: ProcessProbe + ?Sized>(
    files: &StateFiles,
    probe: &P,
    self_pid: u32,
) -> SweepReport {
    let paths = files.paths();
    let mut report = SweepReport::default();

    // Stamp before reading, so a replacement in between never matches
    let lock_stamp = files.lock_stamp();
    let lock_owner = files.read_owner();
    let mut lock_stale = false;

    if lock_stamp.is_some() {
        match lock_owner {
            Some(pid) if is_live_owner(probe, pid, self_pid) => {
                debug!(pid = %pid, path = %paths.lock.display(), "Lock owner is alive");
                report.live_owner = Some(pid);
            }
            Some(pid) => {
                info!(pid = %pid, path = %paths.lock.display(), "Lock owner is gone, removing stale lock");
                lock_stale = true;
            }
            None if files.lock_age().is_some_and(|age| age < MALFORMED_GRACE) => {
                debug!(path = %paths.lock.display(), "Lock is unreadable but fresh, leaving it");
                report.lock_pending = true;
            }
            None => {
                info!(path = %paths.lock.display(), "Lock is malformed, removing");
                lock_stale = true;
            }
        }
    }

    let state_pid = mirror_pid(&paths.state, || files.read_state().map(|s| s.pid));
    let pid_pid = mirror_pid(&paths.pid, || read_pid_file(&paths.pid));

    for (path, recorded) in [(&paths.state, state_pid), (&paths.pid, pid_pid)] {
        let Some(recorded) = recorded else {
            continue;
        };
        let stale = match recorded {
            None => true,
            Some(pid) => match report.live_owner {
                Some(owner) => pid != owner,
                None => lock_stale || !is_live_owner(probe, pid, self_pid),
            },
        };
        if stale {
            remove_logged(path, &mut report.removed);
        }
    }

    if let Some(judged) = lock_stamp.filter(|_| lock_stale) {
        match files.remove_lock_if_stale(lock_owner, judged) {
            Ok(true) => report.removed.push(paths.lock.clone()),
            Ok(false) => debug!(path = %paths.lock.display(), "Stale lock already replaced"),
            Err(e) => warn!(error = %e, "Failed to remove stale lock"),
        }
    }

    if !report.removed.is_empty() {
        info!(
            count = report.removed.len(),
            dir = %paths.dir().map_or_else(String::new, |d| d.display().to_string()),
            "Stale cleanup complete"
        );
    }

    report
}

/// `None`: file absent. `Some(None)`: present but malformed.
fn mirror_pid(path: &Path, read: impl FnOnce() -> Option<u32>) -> Option<Option<u32>> {
    path.exists().then(read)
}

fn remove_logged(path: &Path, removed: &mut Vec<PathBuf>) {
    match remove_if_exists(path) {
        Ok(true) => {
            info!(path = %path.display(), "Removed stale file");
            removed.push(path.to_path_buf());
        }
        Ok(false) => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove stale file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchd_core::domain::OrchestratorDescriptor;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    const SELF: u32 = 100;

    #[derive(Default)]
    struct Liveness {
        orchestrators: HashSet<u32>,
        others: HashSet<u32>,
    }

    impl ProcessProbe for Liveness {
        fn is_alive(&self, pid: u32) -> bool {
            self.orchestrators.contains(&pid) || self.others.contains(&pid)
        }

        fn is_orchestrator(&self, pid: u32) -> bool {
            self.orchestrators.contains(&pid)
        }

        fn find_listener(&self, _port: u16) -> Option<OrchestratorDescriptor> {
            None
        }

        fn probe_port_free(&self, _port: u16) -> bool {
            true
        }
    }

    fn setup() -> (TempDir, StateFiles) {
        let tmp = TempDir::new().unwrap();
        let files = StateFiles::for_port(tmp.path(), 9500);
        (tmp, files)
    }

    fn nothing_left(files: &StateFiles) -> bool {
        files.paths().teardown_order().iter().all(|p| !p.exists())
    }

    #[test]
    fn empty_dir_is_clear() {
        let (_tmp, files) = setup();
        let report = sweep_stale(&files, &Liveness::default(), SELF);
        assert!(report.is_clear());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn dead_owner_triplet_is_removed_lock_last() {
        let (_tmp, files) = setup();
        files.create(99_999, 9500, "orchestrator").unwrap();

        let report = sweep_stale(&files, &Liveness::default(), SELF);

        assert!(report.is_clear());
        assert!(nothing_left(&files));
        assert_eq!(report.removed.last(), Some(&files.paths().lock));
        assert_eq!(report.removed.len(), 3);
    }

    #[test]
    fn live_non_orchestrator_owner_is_stale() {
        let (_tmp, files) = setup();
        files.create(200, 9500, "bash").unwrap();
        let probe = Liveness {
            others: HashSet::from([200]),
            ..Default::default()
        };

        let report = sweep_stale(&files, &probe, SELF);
        assert!(report.is_clear());
        assert!(nothing_left(&files));
    }

    #[test]
    fn live_orchestrator_keeps_everything() {
        let (_tmp, files) = setup();
        files.create(300, 9500, "orchestrator").unwrap();
        let probe = Liveness {
            orchestrators: HashSet::from([300]),
            ..Default::default()
        };

        let report = sweep_stale(&files, &probe, SELF);

        assert_eq!(report.live_owner, Some(300));
        assert!(report.removed.is_empty());
        assert_eq!(files.read_owner(), Some(300));
        assert!(files.read_state().is_some());
    }

    #[test]
    fn own_lock_is_never_stale() {
        let (_tmp, files) = setup();
        files.create(SELF, 9500, "test").unwrap();

        let report = sweep_stale(&files, &Liveness::default(), SELF);
        assert_eq!(report.live_owner, Some(SELF));
        assert!(files.paths().lock.exists());
    }

    #[test]
    fn fresh_empty_lock_is_left_for_its_creator() {
        let (_tmp, files) = setup();
        fs::write(&files.paths().lock, "").unwrap();

        let report = sweep_stale(&files, &Liveness::default(), SELF);

        assert!(report.lock_pending);
        assert!(!report.is_clear());
        assert!(files.paths().lock.exists());
    }

    #[test]
    fn aged_malformed_lock_is_removed() {
        let (_tmp, files) = setup();
        fs::write(&files.paths().lock, "garbage").unwrap();
        fs::File::options()
            .write(true)
            .open(&files.paths().lock)
            .unwrap()
            .set_modified(std::time::SystemTime::now() - Duration::from_secs(60))
            .unwrap();

        let report = sweep_stale(&files, &Liveness::default(), SELF);

        assert!(report.is_clear());
        assert_eq!(report.removed, vec![files.paths().lock.clone()]);
    }

    #[test]
    fn malformed_mirrors_are_removed() {
        let (_tmp, files) = setup();
        fs::write(&files.paths().pid, "garbage").unwrap();
        fs::write(&files.paths().state, "{").unwrap();

        let report = sweep_stale(&files, &Liveness::default(), SELF);
        assert_eq!(report.removed.len(), 2);
        assert!(nothing_left(&files));
    }

    #[test]
    fn mirror_contradicting_live_lock_is_removed() {
        let (_tmp, files) = setup();
        files.create(300, 9500, "orchestrator").unwrap();
        fs::write(&files.paths().pid, "301\n").unwrap();
        let probe = Liveness {
            orchestrators: HashSet::from([300, 301]),
            ..Default::default()
        };

        let report = sweep_stale(&files, &probe, SELF);

        assert_eq!(report.removed, vec![files.paths().pid.clone()]);
        assert_eq!(files.read_owner(), Some(300));
        assert!(files.paths().state.exists());
    }

    #[test]
    fn orphan_mirror_of_live_orchestrator_is_kept() {
        let (_tmp, files) = setup();
        fs::write(&files.paths().pid, "300\n").unwrap();
        let probe = Liveness {
            orchestrators: HashSet::from([300]),
            ..Default::default()
        };

        let report = sweep_stale(&files, &probe, SELF);
        assert!(report.removed.is_empty());
        assert!(report.is_clear());
    }
}
