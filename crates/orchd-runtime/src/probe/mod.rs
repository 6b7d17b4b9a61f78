//! Host process probe implementation for orchd-runtime.
//!
//! This module provides the `HostProcessProbe` which implements
//! `ProcessProbe` from orchd-core. It answers liveness with a null signal,
//! reads command lines through `sysinfo`, and finds listening socket owners
//! through the kernel socket tables.

mod listeners;
mod ports;
mod verify;

use orchd_core::domain::OrchestratorDescriptor;
use orchd_core::ports::{ProcessProbe, cmdline_marks_orchestrator};
use tracing::debug;

pub use listeners::listener_pid;
pub use ports::is_port_available;
pub use verify::{pid_exists, process_cmdline};

/// Default implementation of `ProcessProbe` backed by the host OS.
///
/// It should be constructed at the composition root (CLI `main.rs`) and
/// handed to the `LockManager`.
///
/// # Example
///
/// ```ignore
/// use orchd_runtime::HostProcessProbe;
/// use orchd_core::ports::ProcessProbe;
///
/// let probe = HostProcessProbe::new();
/// let peer = probe.find_listener(9500);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProcessProbe;

impl HostProcessProbe {
    /// Create a new host process probe.
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessProbe for HostProcessProbe {
    fn is_alive(&self, pid: u32) -> bool {
        pid_exists(pid)
    }

    fn is_orchestrator(&self, pid: u32) -> bool {
        pid_exists(pid)
            && process_cmdline(pid).is_some_and(|cmdline| cmdline_marks_orchestrator(&cmdline))
    }

    fn find_listener(&self, port: u16) -> Option<OrchestratorDescriptor> {
        let pid = match listener_pid(port) {
            Ok(Some(pid)) => pid,
            Ok(None) => return None,
            Err(e) => {
                debug!(port = %port, error = %e, "Socket enumeration unavailable");
                return None;
            }
        };

        let cmdline = process_cmdline(pid)?;
        if !cmdline_marks_orchestrator(&cmdline) {
            debug!(port = %port, pid = %pid, "Port held by a non-orchestrator process");
            return None;
        }

        Some(OrchestratorDescriptor::new(pid, port, Some(cmdline)))
    }

    fn probe_port_free(&self, port: u16) -> bool {
        is_port_available(port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_is_alive() {
        let probe = HostProcessProbe::new();
        assert!(probe.is_alive(std::process::id()));
    }

    #[test]
    fn orchestrator_check_follows_own_cmdline() {
        let pid = std::process::id();
        let cmdline = process_cmdline(pid).unwrap();
        let probe = HostProcessProbe::new();
        assert_eq!(
            probe.is_orchestrator(pid),
            cmdline_marks_orchestrator(&cmdline)
        );
    }

    #[test]
    fn missing_pid_is_not_an_orchestrator() {
        assert!(!HostProcessProbe::new().is_orchestrator(999_999_999));
    }

    #[test]
    fn non_orchestrator_listener_is_ignored() {
        let listener = std::net::TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = HostProcessProbe::new();
        let own = process_cmdline(std::process::id()).unwrap();
        if !cmdline_marks_orchestrator(&own) {
            assert!(probe.find_listener(port).is_none());
        }
        assert!(!probe.probe_port_free(port));
    }
}
