//! Process probe port for liveness and peer identification.
//!
//! This port abstracts the four host-process queries the lock manager needs
//! from the core domain. Implementations live in adapters (e.g., orchd-runtime).
//!
//! # Design Notes
//!
//! - Core owns the trait and the orchestrator cmdline rule (pure)
//! - Runtime owns the implementation (signals, process table, socket tables)
//! - Every method is infallible: permission problems fold into the
//!   conservative answer documented per method

use crate::domain::OrchestratorDescriptor;

/// Substring that marks a command line as belonging to an orchestrator.
pub const ORCHESTRATOR_MARKER: &str = "orchestrator";

/// Whether a command line identifies an orchestrator process.
///
/// Case-insensitive substring match on [`ORCHESTRATOR_MARKER`]. This coarse
/// rule is part of the cross-process contract; do not narrow it to process
/// names.
pub fn cmdline_marks_orchestrator(cmdline: &str) -> bool {
    cmdline.to_lowercase().contains(ORCHESTRATOR_MARKER)
}

/// Port for answering host-process questions.
///
/// # Example
///
/// ```ignore
/// use orchd_core::ports::ProcessProbe;
///
/// fn owner_is_live(probe: &dyn ProcessProbe, pid: u32) -> bool {
///     probe.is_alive(pid) && probe.is_orchestrator(pid)
/// }
/// ```
pub trait ProcessProbe: Send + Sync {
    /// True iff a process with this PID exists and is visible to the caller.
    ///
    /// Non-existence and permission-denied both yield `false`.
    fn is_alive(&self, pid: u32) -> bool;

    /// True iff the process exists and its command line passes
    /// [`cmdline_marks_orchestrator`].
    fn is_orchestrator(&self, pid: u32) -> bool;

    /// Find the orchestrator listening on `port`.
    ///
    /// Returns `None` when nothing listens there, when the listener is not an
    /// orchestrator, or when socket enumeration is not permitted.
    fn find_listener(&self, port: u16) -> Option<OrchestratorDescriptor>;

    /// Try to bind `port`. `true` means it is free; `false` means something
    /// (possibly unidentifiable) holds it.
    fn probe_port_free(&self, port: u16) -> bool;
}
