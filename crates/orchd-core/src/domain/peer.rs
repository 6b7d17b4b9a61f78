//! Descriptors for running orchestrator peers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// PID of an apparent peer.
///
/// `Unknown` is produced when the port is held but the owning process cannot
/// be introspected. It serializes as the string `"unknown"`; known PIDs
/// serialize as integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerPid {
    Known(u32),
    Unknown,
}

impl PeerPid {
    /// The numeric PID, if known.
    pub const fn known(self) -> Option<u32> {
        match self {
            Self::Known(pid) => Some(pid),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for PeerPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(pid) => write!(f, "{pid}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for PeerPid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(pid) => serializer.serialize_u32(*pid),
            Self::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for PeerPid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Pid(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Pid(pid) => Ok(Self::Known(pid)),
            Raw::Text(text) if text == "unknown" => Ok(Self::Unknown),
            Raw::Text(text) => text
                .trim()
                .parse()
                .map(Self::Known)
                .map_err(|_| serde::de::Error::custom(format!("invalid peer pid: {text}"))),
        }
    }
}

/// An apparently running orchestrator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorDescriptor {
    pub pid: PeerPid,
    pub port: u16,
    /// Command line of the peer, when it could be read.
    #[serde(default)]
    pub cmdline: Option<String>,
}

impl OrchestratorDescriptor {
    pub const fn new(pid: u32, port: u16, cmdline: Option<String>) -> Self {
        Self {
            pid: PeerPid::Known(pid),
            port,
            cmdline,
        }
    }

    /// Descriptor for a port held by a process we cannot identify.
    pub const fn unknown(port: u16) -> Self {
        Self {
            pid: PeerPid::Unknown,
            port,
            cmdline: None,
        }
    }

    /// Shell command a human can run to stop this peer.
    pub fn kill_hint(&self) -> String {
        match self.pid {
            PeerPid::Known(pid) => format!("kill {pid}"),
            PeerPid::Unknown => format!("kill $(lsof -t -i tcp:{})", self.port),
        }
    }
}

impl fmt::Display for OrchestratorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid={} port={}", self.pid, self.port)?;
        if let Some(cmdline) = &self.cmdline {
            write!(f, " cmdline={cmdline:?}")?;
        }
        Ok(())
    }
}
