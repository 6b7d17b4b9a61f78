#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod admission;
pub mod lock;
pub mod lockfile;
pub mod probe;
pub mod shutdown;
pub mod system;

// Re-export the controller types
pub use admission::{AdmissionError, ForkBombDetector, GROWTH_ALERT_THRESHOLD};
pub use lock::{AcquireError, LockManager};

// Re-export lock file primitives for tooling
pub use lockfile::{LockStamp, StateFileError, StateFiles, SweepReport, sweep_stale};

// Re-export host adapters
pub use probe::{HostProcessProbe, is_port_available, pid_exists};
pub use shutdown::kill_pid;
pub use system::SysinfoLoadSampler;
