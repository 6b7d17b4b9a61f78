//! Host load snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Point-in-time view of host load, produced on demand by a `LoadSampler`.
///
/// Snapshots are never persisted; each admission decision takes a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSnapshot {
    /// Number of processes visible on the host.
    pub process_count: usize,
    /// Change in `process_count` since the sampler was constructed.
    /// Negative when processes exited.
    pub process_growth_since_init: i64,
    /// Global CPU usage in percent (0-100).
    pub cpu_percent: f32,
    /// Used memory in percent of total (0-100).
    pub memory_percent: f32,
}

impl LoadSnapshot {
    /// Snapshot reporting only a process count, with no growth and idle CPU/memory.
    pub const fn with_process_count(process_count: usize) -> Self {
        Self {
            process_count,
            process_growth_since_init: 0,
            cpu_percent: 0.0,
            memory_percent: 0.0,
        }
    }
}

impl fmt::Display for LoadSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processes={} (growth {:+}) cpu={:.1}% memory={:.1}%",
            self.process_count, self.process_growth_since_init, self.cpu_percent, self.memory_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_signed_growth() {
        let snapshot = LoadSnapshot {
            process_count: 412,
            process_growth_since_init: -3,
            cpu_percent: 12.34,
            memory_percent: 40.0,
        };
        assert_eq!(
            snapshot.to_string(),
            "processes=412 (growth -3) cpu=12.3% memory=40.0%"
        );
    }

    #[test]
    fn with_process_count_is_otherwise_idle() {
        let snapshot = LoadSnapshot::with_process_count(2001);
        assert_eq!(snapshot.process_count, 2001);
        assert_eq!(snapshot.process_growth_since_init, 0);
    }
}
