//! Process verification: liveness and command line lookup.

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

/// Check if a PID exists and can be signalled by us.
///
/// Uses `kill` with the null signal, which checks existence without
/// delivering anything. Permission-denied counts as "not alive": a lock owned
/// by a process we cannot see is treated as stale.
#[cfg(unix)]
pub fn pid_exists(pid: u32) -> bool {
    use nix::sys::signal;
    use nix::unistd::Pid as NixPid;

    // PID 0 and values above i32::MAX would address process groups
    let Some(raw) = i32::try_from(pid).ok().filter(|raw| *raw > 0) else {
        return false;
    };

    signal::kill(NixPid::from_raw(raw), None).is_ok()
}

#[cfg(not(unix))]
pub fn pid_exists(pid: u32) -> bool {
    pid != 0 && process_cmdline(pid).is_some()
}

/// Read the command line of a process, arguments joined by spaces.
///
/// Returns `None` when the process does not exist or cannot be inspected.
/// Kernel threads and zombies report an empty command line.
pub fn process_cmdline(pid: u32) -> Option<String> {
    let target = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[target]),
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    let process = system.process(target)?;
    let args: Vec<String> = process
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    Some(args.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn pid_exists_for_self() {
        let self_pid = std::process::id();
        assert!(pid_exists(self_pid));
    }

    #[test]
    #[cfg(unix)]
    fn pid_exists_false_for_impossible_pid() {
        assert!(!pid_exists(999_999_999));
    }

    #[test]
    fn pid_zero_is_never_alive() {
        assert!(!pid_exists(0));
    }

    #[test]
    fn cmdline_of_self_is_readable() {
        let cmdline = process_cmdline(std::process::id()).expect("own cmdline");
        assert!(!cmdline.is_empty());
    }

    #[test]
    fn cmdline_of_missing_pid_is_none() {
        assert!(process_cmdline(999_999_999).is_none());
    }
}
