//! Port availability probing.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, TcpListener};

/// Check if a port is available by attempting to bind to it.
///
/// Binds the IPv4 and then the IPv6 unspecified address, which conflict with
/// a listener on any local interface of that family. A host without IPv6
/// only answers for IPv4. Listeners are dropped immediately, releasing the
/// port. A peer may bind right after this returns; callers accept that window.
pub fn is_port_available(port: u16) -> bool {
    if !bind(Ipv4Addr::UNSPECIFIED.into(), port).unwrap_or(false) {
        return false;
    }
    match bind(Ipv6Addr::UNSPECIFIED.into(), port) {
        Ok(available) => available,
        Err(e) => e.kind() != io::ErrorKind::AddrInUse,
    }
}

fn bind(addr: IpAddr, port: u16) -> io::Result<bool> {
    let listener = TcpListener::bind((addr, port))?;
    // Get the actual bound address to ensure it worked
    Ok(listener.local_addr().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_port_is_not_available() {
        let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(!is_port_available(port));

        drop(listener);
        assert!(is_port_available(port));
    }

    #[test]
    fn ipv6_only_listener_is_not_available() {
        let Ok(listener) = TcpListener::bind((Ipv6Addr::LOCALHOST, 0)) else {
            // No IPv6 on this host
            return;
        };
        let port = listener.local_addr().unwrap().port();
        assert!(!is_port_available(port));

        drop(listener);
        assert!(is_port_available(port));
    }
}
