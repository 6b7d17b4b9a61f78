//! Terminate a peer orchestrator by PID without reaping it.

use std::io;
use std::time::Duration;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::{Instant, sleep};
#[cfg(unix)]
use tracing::{debug, warn};

/// Interval between liveness checks while waiting for exit.
#[cfg(unix)]
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to wait for exit after SIGKILL.
#[cfg(unix)]
const KILL_WAIT: Duration = Duration::from_secs(2);

/// Kill a process by PID with SIGTERM → SIGKILL escalation.
///
/// # Strategy
/// 1. Send SIGTERM
/// 2. Poll for up to `grace` to verify process exit
/// 3. If still alive, send SIGKILL
/// 4. Poll again for up to 2 seconds
///
/// No `Child` handle is available, so the process is never reaped here.
/// A zombie child of the caller keeps answering the null signal until its
/// parent waits on it.
///
/// # Returns
/// - `Ok(())` if the process was killed or already gone
/// - `Err` if signalling fails (excluding ESRCH) or the process survives
pub async fn kill_pid(pid: u32, grace: Duration) -> io::Result<()> {
    #[cfg(unix)]
    {
        kill_pid_unix(pid, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = (pid, grace);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "force takeover is only implemented on Unix",
        ))
    }
}

#[cfg(unix)]
async fn kill_pid_unix(pid: u32, grace: Duration) -> io::Result<()> {
    // 0 and negative values would signal whole process groups
    let raw = i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("refusing to signal pid {pid}")))?;
    let nix_pid = Pid::from_raw(raw);

    // Phase 1: SIGTERM
    match signal::kill(nix_pid, Signal::SIGTERM) {
        Ok(()) => debug!(pid = %pid, "Sent SIGTERM"),
        Err(Errno::ESRCH) => return Ok(()),
        Err(e) => return Err(io::Error::other(e)),
    }

    if wait_for_exit(nix_pid, grace).await {
        return Ok(());
    }

    // Phase 2: SIGKILL
    warn!(pid = %pid, grace_ms = grace.as_millis(), "Process ignored SIGTERM, sending SIGKILL");
    match signal::kill(nix_pid, Signal::SIGKILL) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(()),
        Err(e) => return Err(io::Error::other(e)),
    }

    if wait_for_exit(nix_pid, KILL_WAIT).await {
        return Ok(());
    }

    Err(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("process {pid} did not exit after SIGKILL"),
    ))
}

/// Poll the null signal until ESRCH or the deadline passes.
#[cfg(unix)]
async fn wait_for_exit(pid: Pid, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    loop {
        sleep(POLL_INTERVAL).await;
        // EPERM means it still exists under another user
        if signal::kill(pid, None) == Err(Errno::ESRCH) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
    }
}
