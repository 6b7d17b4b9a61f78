//! Admission refusals.

use thiserror::Error;

/// Why a prospective spawn was refused.
///
/// Both variants are transient: callers should report "temporarily refused"
/// to their own caller rather than retry in a tight loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("Host has {process_count} processes, above the limit of {limit}")]
    SystemCeiling { process_count: usize, limit: usize },

    #[error("Spawn rate exceeded: {admitted} spawns admitted in the last {window_secs}s (limit {threshold})")]
    RateExceeded {
        admitted: usize,
        threshold: usize,
        window_secs: u64,
    },
}
