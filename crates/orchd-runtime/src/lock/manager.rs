//! Single-instance lock manager.

use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use orchd_core::domain::{LockState, OrchestratorDescriptor, PeerPid};
use orchd_core::ports::ProcessProbe;
use orchd_core::settings::{DEFAULT_FORCE_GRACE_SECS, GuardSettings};
use tracing::{debug, info, warn};

use super::error::AcquireError;
use crate::lockfile::{StateFileError, StateFiles, SweepReport, is_live_owner, sweep_stale};
use crate::shutdown::kill_pid;

/// Acquires and releases the lock triplet for one orchestrator instance.
///
/// One manager guards at most one port. After `release` the manager is spent
/// and a new one must be built. Dropping a manager that still holds the lock
/// releases it.
#[derive(Debug)]
pub struct LockManager<P: ProcessProbe> {
    probe: P,
    lock_dir: PathBuf,
    pid: u32,
    cmdline: String,
    force_grace: Duration,
    state: LockState,
    port: Option<u16>,
    files: Option<StateFiles>,
}

impl<P: ProcessProbe> LockManager<P> {
    /// Manager acting for the current process.
    pub fn new(probe: P, lock_dir: impl Into<PathBuf>) -> Self {
        Self {
            probe,
            lock_dir: lock_dir.into(),
            pid: process::id(),
            cmdline: env::args().collect::<Vec<_>>().join(" "),
            force_grace: Duration::from_secs(DEFAULT_FORCE_GRACE_SECS),
            state: LockState::Unlocked,
            port: None,
            files: None,
        }
    }

    pub fn from_settings(probe: P, settings: &GuardSettings) -> Self {
        Self::new(probe, &settings.lock_dir).with_force_grace(settings.force_grace())
    }

    /// Act on behalf of another owner PID.
    #[must_use]
    pub fn with_owner(mut self, pid: u32, cmdline: impl Into<String>) -> Self {
        self.pid = pid;
        self.cmdline = cmdline.into();
        self
    }

    /// Wait between SIGTERM and SIGKILL during force takeover.
    #[must_use]
    pub const fn with_force_grace(mut self, grace: Duration) -> Self {
        self.force_grace = grace;
        self
    }

    pub const fn state(&self) -> LockState {
        self.state
    }

    /// Port held, once locked.
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    pub const fn pid(&self) -> u32 {
        self.pid
    }

    pub const fn probe(&self) -> &P {
        &self.probe
    }

    pub fn lock_dir(&self) -> &Path {
        &self.lock_dir
    }

    /// Triplet held by this manager, once locked.
    pub const fn files(&self) -> Option<&StateFiles> {
        self.files.as_ref()
    }

    /// Triplet paths for `port` in this manager's lock directory.
    pub fn files_for(&self, port: u16) -> StateFiles {
        StateFiles::for_port(&self.lock_dir, port)
    }

    /// Remove stale files for `port`. Live owners are left alone.
    pub fn clean_stale(&self, port: u16) -> SweepReport {
        sweep_stale(&self.files_for(port), &self.probe, self.pid)
    }

    /// Find a running orchestrator on `port` other than ourselves.
    ///
    /// Sources, first match wins:
    /// 1. `state` mirror, if its PID is a live orchestrator and `lock` does
    ///    not name someone else
    /// 2. `lock` owner, if it is a live orchestrator
    /// 3. The process listening on `port`, if it is an orchestrator
    /// 4. A busy port with no identifiable owner
    pub fn detect_peer(&self, port: u16) -> Option<OrchestratorDescriptor> {
        let files = self.files_for(port);
        let lock_owner = files.read_owner();

        if let Some(record) = files.read_state()
            && record.pid != self.pid
            && lock_owner.is_none_or(|owner| owner == record.pid)
            && self.probe.is_orchestrator(record.pid)
        {
            debug!(pid = %record.pid, port = %port, "Peer found in state file");
            return Some(OrchestratorDescriptor::new(record.pid, port, Some(record.cmdline)));
        }

        if let Some(owner) = lock_owner
            && owner != self.pid
            && is_live_owner(&self.probe, owner, self.pid)
        {
            debug!(pid = %owner, port = %port, "Peer found in lock file");
            return Some(OrchestratorDescriptor::new(owner, port, None));
        }

        if let Some(peer) = self.probe.find_listener(port)
            && peer.pid != PeerPid::Known(self.pid)
        {
            debug!(pid = %peer.pid, port = %port, "Peer found listening on port");
            return Some(peer);
        }

        if !self.probe.probe_port_free(port) {
            debug!(port = %port, "Port is busy but its owner is unknown");
            return Some(OrchestratorDescriptor::unknown(port));
        }

        None
    }

    /// Acquire the lock for `port`, reporting why on failure.
    ///
    /// # Steps
    /// 1. Sweep stale files
    /// 2. Detect a running peer
    /// 3. Without `force`, a peer is an error; with `force`, terminate it
    ///    and sweep again
    /// 4. Claim `lock` with exclusive create; losing that race is an error
    pub async fn try_acquire(&mut self, port: u16, force: bool) -> Result<(), AcquireError> {
        match (self.state, self.port) {
            (LockState::Released, _) => return Err(AcquireError::AlreadyReleased),
            (LockState::Locked, Some(held)) if held == port => return Ok(()),
            (LockState::Locked, Some(held)) => {
                return Err(AcquireError::AlreadyHeld {
                    held,
                    requested: port,
                });
            }
            _ => {}
        }

        let files = self.files_for(port);
        self.clean_stale(port);

        if let Some(peer) = self.detect_peer(port) {
            info!(peer = %peer, force = force, "Detected running orchestrator");
            if !force {
                return Err(AcquireError::PeerPresent { peer });
            }
            self.take_over(&peer).await?;
            let report = self.clean_stale(port);
            debug!(removed = report.removed.len(), "Swept after takeover");
        }

        match files.create(self.pid, port, &self.cmdline) {
            Ok(()) => {
                info!(pid = %self.pid, port = %port, lock = %files.paths().lock.display(), "Lock acquired");
                self.state = LockState::Locked;
                self.port = Some(port);
                self.files = Some(files);
                Ok(())
            }
            Err(StateFileError::AlreadyExists(_)) => Err(AcquireError::RaceLost { port }),
            Err(e) => Err(AcquireError::Io(e)),
        }
    }

    /// Acquire the lock for `port`. Every failure folds into `false`.
    pub async fn acquire(&mut self, port: u16, force: bool) -> bool {
        match self.try_acquire(port, force).await {
            Ok(()) => true,
            Err(e) => {
                warn!(port = %port, error = %e, "Failed to acquire lock");
                false
            }
        }
    }

    /// Release the lock if this manager holds it.
    ///
    /// Owner-checked, idempotent, never blocks and never fails. Filesystem
    /// errors are logged. Safe to call from exit paths.
    pub fn release(&mut self) {
        if self.state != LockState::Locked {
            return;
        }
        if let Some(files) = &self.files
            && let Err(e) = files.delete_if_owned_by(self.pid)
        {
            warn!(error = %e, "Failed to remove lock files on release");
        }
        self.state = LockState::Released;
    }

    async fn take_over(&self, peer: &OrchestratorDescriptor) -> Result<(), AcquireError> {
        let PeerPid::Known(pid) = peer.pid else {
            return Err(AcquireError::UnknownPeer { port: peer.port });
        };

        warn!(
            pid = %pid,
            port = %peer.port,
            grace_secs = self.force_grace.as_secs(),
            "Force takeover: terminating running orchestrator"
        );
        kill_pid(pid, self.force_grace)
            .await
            .map_err(|source| AcquireError::TakeoverFailed { pid, source })?;
        warn!(pid = %pid, "Force takeover: previous orchestrator terminated");
        Ok(())
    }
}

impl<P: ProcessProbe> Drop for LockManager<P> {
    fn drop(&mut self) {
        self.release();
    }
}
