//! Host load sampling for orchd-runtime.
//!
//! This module provides the `SysinfoLoadSampler` which implements
//! `LoadSampler` from orchd-core. It keeps one `sysinfo::System` alive
//! between snapshots so CPU usage is measured as a delta.

use orchd_core::domain::LoadSnapshot;
use orchd_core::ports::LoadSampler;
use sysinfo::{MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, System};

/// Default implementation of `LoadSampler` backed by `sysinfo`.
///
/// It should be constructed at the composition root and handed to the
/// `ForkBombDetector`. Construction takes the baseline process count that
/// `process_growth_since_init` is measured against.
///
/// # Example
///
/// ```ignore
/// use orchd_runtime::SysinfoLoadSampler;
/// use orchd_core::ports::LoadSampler;
///
/// let mut sampler = SysinfoLoadSampler::new();
/// let snapshot = sampler.snapshot();
/// println!("{snapshot}");
/// ```
pub struct SysinfoLoadSampler {
    system: System,
    initial_count: usize,
}

impl SysinfoLoadSampler {
    /// Create a sampler and record the baseline process count.
    pub fn new() -> Self {
        let mut system = System::new();
        let initial_count = count_processes(&mut system);
        // Primes the CPU delta for the first snapshot
        system.refresh_cpu_usage();
        Self {
            system,
            initial_count,
        }
    }

    /// Process count observed at construction.
    pub const fn initial_count(&self) -> usize {
        self.initial_count
    }
}

impl Default for SysinfoLoadSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysinfoLoadSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoLoadSampler")
            .field("initial_count", &self.initial_count)
            .finish_non_exhaustive()
    }
}

impl LoadSampler for SysinfoLoadSampler {
    fn snapshot(&mut self) -> LoadSnapshot {
        let process_count = count_processes(&mut self.system);

        self.system.refresh_cpu_usage();
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        LoadSnapshot {
            process_count,
            process_growth_since_init: growth(self.initial_count, process_count),
            cpu_percent: self.system.global_cpu_usage(),
            memory_percent: memory_percent(self.system.used_memory(), self.system.total_memory()),
        }
    }
}

/// Count processes host-wide, excluding threads that sysinfo lists as tasks.
fn count_processes(system: &mut System) -> usize {
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::nothing());
    system
        .processes()
        .values()
        .filter(|process| process.thread_kind().is_none())
        .count()
}

fn growth(initial: usize, current: usize) -> i64 {
    let initial = i64::try_from(initial).unwrap_or(i64::MAX);
    let current = i64::try_from(current).unwrap_or(i64::MAX);
    current.saturating_sub(initial)
}

#[allow(clippy::cast_precision_loss)]
fn memory_percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((used as f64 / total as f64) * 100.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_sees_at_least_this_process() {
        let mut sampler = SysinfoLoadSampler::new();
        let snapshot = sampler.snapshot();
        assert!(snapshot.process_count >= 1);
        assert!((0.0..=100.0).contains(&snapshot.memory_percent));
        assert!(snapshot.cpu_percent >= 0.0);
    }

    #[test]
    fn growth_is_relative_to_construction() {
        let mut sampler = SysinfoLoadSampler::new();
        let snapshot = sampler.snapshot();
        let expected = growth(sampler.initial_count(), snapshot.process_count);
        assert_eq!(snapshot.process_growth_since_init, expected);
    }

    #[test]
    fn growth_can_be_negative() {
        assert_eq!(growth(10, 25), 15);
        assert_eq!(growth(25, 10), -15);
    }

    #[test]
    fn memory_percent_handles_zero_total() {
        assert!(memory_percent(10, 0).abs() < f32::EPSILON);
        assert!((memory_percent(50, 200) - 25.0).abs() < 1e-4);
    }
}
