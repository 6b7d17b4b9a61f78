//! Errors from lock acquisition.

use std::io;

use orchd_core::domain::OrchestratorDescriptor;
use thiserror::Error;

/// Why `LockManager::try_acquire` did not take the lock.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// A running orchestrator holds the port and `force` was not set.
    #[error("Another orchestrator is running ({peer}). Stop it with `{hint}` or retry with --force", hint = .peer.kill_hint())]
    PeerPresent { peer: OrchestratorDescriptor },

    /// Another process created `lock` between cleanup and claim.
    #[error("Lost the race for port {port}: another orchestrator claimed it first")]
    RaceLost { port: u16 },

    /// The port is held but its owner cannot be identified, so it cannot be
    /// terminated.
    #[error("Port {port} is in use by an unidentified process; cannot force takeover")]
    UnknownPeer { port: u16 },

    /// The peer survived SIGTERM and SIGKILL, or could not be signalled.
    #[error("Failed to terminate orchestrator PID {pid}: {source}")]
    TakeoverFailed {
        pid: u32,
        #[source]
        source: io::Error,
    },

    /// This manager already holds the lock for a different port.
    #[error("Lock manager already holds port {held}; cannot also acquire port {requested}")]
    AlreadyHeld { held: u16, requested: u16 },

    /// `release` was called; a manager is single-use.
    #[error("Lock manager was released and cannot acquire again")]
    AlreadyReleased,

    /// Creating the lock triplet failed.
    #[error("Failed to create lock files: {0}")]
    Io(#[source] crate::lockfile::StateFileError),
}

impl AcquireError {
    /// Whether the failure was caused by a competing orchestrator.
    pub const fn is_contention(&self) -> bool {
        matches!(
            self,
            Self::PeerPresent { .. } | Self::RaceLost { .. } | Self::UnknownPeer { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_present_message_names_pid_and_hint() {
        let err = AcquireError::PeerPresent {
            peer: OrchestratorDescriptor::new(4242, 9500, None),
        };
        let message = err.to_string();
        assert!(message.contains("4242"));
        assert!(message.contains("kill 4242"));
        assert!(message.contains("--force"));
        assert!(err.is_contention());
    }

    #[test]
    fn unknown_peer_message_names_port() {
        let err = AcquireError::UnknownPeer { port: 9500 };
        assert!(err.to_string().contains("9500"));
    }
}
