//! LISTEN socket enumeration.
//!
//! On Linux the kernel socket tables in `/proc/net/tcp` and `/proc/net/tcp6`
//! give the inode of every listening socket; the owning PID is found by
//! scanning `/proc/<pid>/fd` for a `socket:[<inode>]` link. Other platforms
//! report `Unsupported` so callers fall back to a bind probe.

use std::io;

#[cfg(target_os = "linux")]
use std::fs;

/// Kernel state code for `TCP_LISTEN` in `/proc/net/tcp*`.
#[cfg(any(target_os = "linux", test))]
const TCP_LISTEN: &str = "0A";

/// Find the PID owning a listening TCP socket on `port`.
///
/// - `Ok(Some(pid))`: a listener exists and its owner is visible
/// - `Ok(None)`: no listener, or the owner's fds cannot be read
/// - `Err`: the socket tables themselves are unreadable
#[cfg(target_os = "linux")]
pub fn listener_pid(port: u16) -> io::Result<Option<u32>> {
    let mut inodes = Vec::new();
    for table in ["/proc/net/tcp", "/proc/net/tcp6"] {
        match fs::read_to_string(table) {
            Ok(content) => inodes.extend(parse_listening_inodes(&content, port)),
            // tcp6 is absent on kernels without IPv6
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }

    if inodes.is_empty() {
        return Ok(None);
    }

    socket_owner(&inodes)
}

#[cfg(not(target_os = "linux"))]
pub fn listener_pid(_port: u16) -> io::Result<Option<u32>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "socket enumeration is only implemented on Linux",
    ))
}

/// Extract inodes of LISTEN sockets bound to `port` from a `/proc/net/tcp*` table.
#[cfg(any(target_os = "linux", test))]
fn parse_listening_inodes(content: &str, port: u16) -> Vec<u64> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            // sl local_address rem_address st tx:rx tr:when retrnsmt uid timeout inode
            if fields.len() < 10 || fields[3] != TCP_LISTEN {
                return None;
            }
            let (_, port_hex) = fields[1].rsplit_once(':')?;
            let local_port = u16::from_str_radix(port_hex, 16).ok()?;
            if local_port != port {
                return None;
            }
            fields[9].parse::<u64>().ok().filter(|inode| *inode != 0)
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn socket_owner(inodes: &[u64]) -> io::Result<Option<u32>> {
    let targets: Vec<String> = inodes.iter().map(|i| format!("socket:[{i}]")).collect();

    for entry in fs::read_dir("/proc")? {
        let Ok(entry) = entry else {
            continue;
        };
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<u32>().ok())
        else {
            continue;
        };

        // Other users' fd tables are unreadable without privileges
        let Ok(fds) = fs::read_dir(entry.path().join("fd")) else {
            continue;
        };

        for fd in fds.flatten() {
            if let Ok(link) = fs::read_link(fd.path())
                && targets.iter().any(|t| link.as_os_str() == t.as_str())
            {
                return Ok(Some(pid));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:251C 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 48213 1 0000000000000000 100 0 0 10 0
   1: 00000000:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 19876 1 0000000000000000 100 0 0 10 0
   2: 0100007F:251C 0100007F:D2A4 01 00000000:00000000 00:00000000 00000000  1000        0 48999 1 0000000000000000 20 4 30 10 -1
";

    #[test]
    fn parses_only_listen_rows_for_port() {
        // 0x251C == 9500
        assert_eq!(parse_listening_inodes(SAMPLE, 9500), vec![48213]);
        assert_eq!(parse_listening_inodes(SAMPLE, 22), vec![19876]);
        assert!(parse_listening_inodes(SAMPLE, 8080).is_empty());
    }

    #[test]
    fn tolerates_short_and_garbage_rows() {
        let content = "header\n0: zz\n1: 0100007F:XYZ 0 0A a b c d e 5\n";
        assert!(parse_listening_inodes(content, 9500).is_empty());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn finds_own_listener() {
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(listener_pid(port).unwrap(), Some(std::process::id()));
    }
}
